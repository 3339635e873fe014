//! Prompt templates for the agent loop and its side calls.
//!
//! Two system prompts exist, one per decision grammar; which one a run uses
//! is fixed by configuration. The remaining templates cover the start-URL
//! planner, the terminal judge, insight extraction, and the two memory
//! summaries recomputed on every episode write.

use webpilot_core_types::MemoryEntry;

use action_parser::ActionGrammar;

/// System prompt for models speaking the function-call grammar.
pub const CALL_SYSTEM_PROMPT: &str = r#"You are a GUI agent. You are given a task and your action history, with screenshots. You need to perform the next action to complete the task.

## Output Format
```
Thought: ...
Action: ...
```

## Action Space

click(point='<point>x1 y1</point>')
left_double(point='<point>x1 y1</point>')
right_single(point='<point>x1 y1</point>')
drag(start_box='<point>x1 y1</point>', end_box='<point>x2 y2</point>')
hotkey(key='ctrl c') # Split keys with a space and use lowercase. Do not use more than 3 keys in one hotkey action.
type(content='xxx') # Use escape characters \', \", and \n in the content part. If you want to submit your input, use \n at the end of content.
scroll(point='<point>x1 y1</point>', direction='down or up or right or left') # Show more information on the `direction` side.
wait() # Sleep for 5s and take a screenshot to check for any changes.
navigate(url='https://example.com') # Go directly to a URL.
finished(content='xxx') # Use escape characters \', \", and \n in the content part.

## Note
- Write a small plan and finally summarize your next action (with its target element) in one sentence in the `Thought` part.

DO NOT REPEAT ACTIONS. If an action is not successful, try something else. If you've already clicked on something, don't click on it again, either try another action or do something else like typing.

If you are stuck or a website is blocked, use the finished action to stop with the content "STUCK".

## User Instruction
{instruction}"#;

/// System prompt for models speaking the tag grammar.
pub const TAG_SYSTEM_PROMPT: &str = r#"You are a GUI agent. You are given a task and your action history, with screenshots. You need to perform the next action to complete the task.

## Output Format
Reply with exactly one action:

<reasoning>your reasoning here</reasoning>
<action_type>NAME</action_type>
<action_argument name="ARG">VALUE</action_argument>

Repeat the action_argument block once per argument.

## Action Space

click: point
left_double: point
right_single: point
drag: start_box, end_box
hotkey: key (split keys with a space, lowercase, at most 3 keys)
type: content (end with a newline to submit the input)
scroll: point, direction (one of up, down, left, right)
wait: no arguments (sleeps 5s, then a fresh screenshot is taken)
navigate: url
finished: content (your final answer)

Coordinates are written as (x,y).

DO NOT REPEAT ACTIONS. If an action is not successful, try something else.

If you are stuck or a website is blocked, emit the finished action with the content "STUCK".

## User Instruction
{instruction}"#;

/// Start-URL planner prompt.
pub const PLANNER_PROMPT: &str = r#"You must identify the optimal starting url for a browsing agent to solve the task. You can't start with google.com. Start at a site's base url, not some subpage.

Respond in this format:
START_URL: https://www.apple.com

{memory}Here is the user's task: {task}"#;

/// Fill the grammar-appropriate system prompt with the task and optional
/// memory context.
pub fn format_system_prompt(grammar: ActionGrammar, task: &str, memory_context: Option<&str>) -> String {
    let template = match grammar {
        ActionGrammar::Call => CALL_SYSTEM_PROMPT,
        ActionGrammar::Tag => TAG_SYSTEM_PROMPT,
    };
    let mut prompt = template.replace("{instruction}", task);
    if let Some(context) = memory_context {
        prompt.push_str("\n\n## What You Know About This Site\n");
        prompt.push_str(context);
    }
    prompt
}

/// Memory context block injected into the system prompt when a start site is
/// known.
pub fn format_memory_context(
    site_summary: &str,
    procedural_summary: &str,
    recent: &[MemoryEntry],
) -> String {
    let mut context = format!(
        "Site patterns:\n{site_summary}\n\nApproaches that worked before:\n{procedural_summary}\n"
    );
    if !recent.is_empty() {
        context.push_str("\nRecent attempts:\n");
        for entry in recent {
            let outcome = if entry.success { "succeeded" } else { "failed" };
            context.push_str(&format!(
                "- \"{}\" ({outcome}, {} actions)\n",
                entry.task,
                entry.trajectory.len()
            ));
        }
    }
    context
}

/// Fill the planner prompt with the task and the cross-site procedural
/// overview (empty overview contributes nothing).
pub fn format_planner_prompt(task: &str, procedural_overview: &str) -> String {
    let memory = if procedural_overview.is_empty() {
        String::new()
    } else {
        format!("Approaches that worked on sites you know:\n{procedural_overview}\n\n")
    };
    PLANNER_PROMPT
        .replace("{memory}", &memory)
        .replace("{task}", task)
}

/// Notice appended to the next observation turn after an unparseable reply.
pub fn format_parse_failure(error: &str) -> String {
    format!(
        "Your previous reply could not be parsed as an action: {error}. \
         Reply with exactly one action in the required output format."
    )
}

/// Notice appended to the next observation turn after an action that failed
/// to execute.
pub fn format_execution_failure(kind: &str) -> String {
    format!(
        "Your previous {kind} action failed to execute; the page may not have \
         changed. Try a different action or target."
    )
}

/// Judge prompt: decide whether the terminal message actually completed the
/// task. Expects a JSON object reply with a boolean `success` field.
pub fn format_judge_prompt(task: &str, final_message: &str, url: &str) -> String {
    format!(
        r#"A browsing agent just stopped working on a task. Judge whether it actually completed the task.

Task: {task}
Final page: {url}
Agent's final message: {final_message}

Reply with a JSON object: {{"success": true or false, "reasoning": "one sentence"}}"#
    )
}

/// Insight prompt: structured post-hoc analysis of one run. Expects a JSON
/// object with `key_learnings`, `improvement_areas` and `success_factors`
/// string arrays.
pub fn format_insight_prompt(task: &str, result: &str, success: bool) -> String {
    format!(
        r#"Analyze the following task execution and provide key insights.
Task: {task}
Result: {result}
Success: {success}

Provide insights about what was learned, what could be improved, and what factors contributed to success or failure.
Reply with a JSON object: {{"key_learnings": [...], "improvement_areas": [...], "success_factors": [...]}} where each array holds short strings."#
    )
}

/// Semantic summary prompt over every episode recorded for a site.
pub fn format_site_summary_prompt(url: &str, episodes_json: &str) -> String {
    format!(
        r#"Analyze the following episodes for the website {url} and provide a concise summary of:
1. Common patterns and behaviors observed
2. Typical issues and how to avoid them
3. Best practices for interacting with this site

Episodes:
{episodes_json}

Provide a clear, concise summary that would be helpful for future interactions with this site."#
    )
}

/// Procedural summary prompt over the successful episodes for a site.
pub fn format_procedural_summary_prompt(url: &str, episodes_json: &str) -> String {
    format!(
        r#"Analyze the following successful episodes for the website {url} and provide a concise summary of:
1. Most effective approaches and strategies
2. Key steps that led to success
3. Tips for efficiently completing tasks on this site

Successful Episodes:
{episodes_json}

Provide a clear, concise summary that would be helpful for future tasks on this site."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_task_and_memory() {
        let prompt = format_system_prompt(
            ActionGrammar::Call,
            "find a fridge under $1000",
            Some("Site patterns:\nslow search box\n"),
        );
        assert!(prompt.contains("find a fridge under $1000"));
        assert!(prompt.contains("slow search box"));
        assert!(!prompt.contains("{instruction}"));
    }

    #[test]
    fn tag_prompt_describes_tag_output() {
        let prompt = format_system_prompt(ActionGrammar::Tag, "task", None);
        assert!(prompt.contains("<action_type>"));
        assert!(!prompt.contains("Thought:"));
    }

    #[test]
    fn planner_prompt_omits_empty_memory() {
        let prompt = format_planner_prompt("buy socks", "");
        assert!(prompt.contains("buy socks"));
        assert!(!prompt.contains("sites you know"));

        let with_memory = format_planner_prompt("buy socks", "Site: https://a.example\nworks");
        assert!(with_memory.contains("sites you know"));
    }

    #[test]
    fn memory_context_lists_recent_outcomes() {
        let entry = MemoryEntry::new("old task", true, Vec::new(), "https://a.example", Default::default());
        let context = format_memory_context("patterns", "approaches", &[entry]);
        assert!(context.contains("old task"));
        assert!(context.contains("succeeded"));
    }
}
