//! Prompt rendering for the three oracle roles.
//!
//! Templates are embedded minijinja files. The builder carries a byte budget
//! and truncates oversized variable inputs with an explicit marker, so
//! prompt size stays bounded regardless of file sizes or run length. Budget
//! shares are coarse: the dominant input of each prompt gets the largest
//! slice.

use minijinja::{Environment, context};

const DECIDE_TEMPLATE: &str = include_str!("prompts/decide.md");
const EDIT_PLAN_TEMPLATE: &str = include_str!("prompts/edit_plan.md");
const RESPOND_TEMPLATE: &str = include_str!("prompts/respond.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("decide", DECIDE_TEMPLATE)
            .expect("decide template should be valid");
        env.add_template("edit_plan", EDIT_PLAN_TEMPLATE)
            .expect("edit_plan template should be valid");
        env.add_template("respond", RESPOND_TEMPLATE)
            .expect("respond template should be valid");
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> String {
        let template = self.env.get_template(name).expect("template is registered");
        template
            .render(ctx)
            .expect("template rendering should not fail")
    }
}

/// Builds prompts within a byte budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    /// Prompt for the next-tool decision.
    pub fn build_decide(&self, request: &str, working_dir: &str, history: Option<&str>) -> String {
        let engine = PromptEngine::new();
        let history = history.map(|text| clamp(text, self.budget_bytes / 2));
        engine.render(
            "decide",
            context! {
                request => request,
                working_dir => working_dir,
                history => history,
            },
        )
    }

    /// Prompt for planning line edits against a file snapshot.
    pub fn build_edit_plan(&self, file_content: &str, instructions: &str, code_edit: &str) -> String {
        let engine = PromptEngine::new();
        engine.render(
            "edit_plan",
            context! {
                file_content => clamp(file_content, self.budget_bytes / 2),
                instructions => clamp(instructions, self.budget_bytes / 8),
                code_edit => {
                    let clamped = clamp(code_edit, self.budget_bytes / 4);
                    (!clamped.is_empty()).then_some(clamped)
                },
            },
        )
    }

    /// Prompt for composing the final user-facing response.
    pub fn build_respond(&self, request: &str, report: &str) -> String {
        let engine = PromptEngine::new();
        engine.render(
            "respond",
            context! {
                request => request,
                report => clamp(report, self.budget_bytes / 2),
            },
        )
    }
}

/// Truncate to at most `max_bytes`, on a char boundary, marking elision.
fn clamp(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cut = max_bytes;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n[truncated {} bytes]", &text[..cut], text.len() - cut)
}
