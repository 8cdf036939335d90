//! Interactive update selection
//!
//! Presents the filtered candidates as a multi-select prompt and returns
//! the chosen modules; the app layer applies them through the upgrader.
//! Behind the UpdateSelector trait so the pipeline is testable without a
//! terminal.

use crate::error::AppError;
use crate::format;
use crate::scanner::Module;
use chrono::Utc;
use inquire::{InquireError, MultiSelect};

/// Rendering options the app layer hands to the selector
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    /// Order choices by diff group
    pub group: bool,
    /// Append publish times to choice labels
    pub time: bool,
}

/// Interactive selection over the grouped candidates
pub trait UpdateSelector {
    /// Returns the modules the user picked; an empty vec means nothing
    /// was selected (including a canceled prompt).
    fn select(
        &self,
        direct: Vec<Module>,
        indirect: Vec<Module>,
        transitive: Vec<Module>,
        opts: SelectOptions,
    ) -> Result<Vec<Module>, AppError>;
}

/// Terminal prompt selector backed by inquire
#[derive(Debug, Default)]
pub struct PromptSelector;

impl UpdateSelector for PromptSelector {
    fn select(
        &self,
        mut direct: Vec<Module>,
        mut indirect: Vec<Module>,
        mut transitive: Vec<Module>,
        opts: SelectOptions,
    ) -> Result<Vec<Module>, AppError> {
        if opts.group {
            sort_by_group(&mut direct);
            sort_by_group(&mut indirect);
            sort_by_group(&mut transitive);
        }

        let mut choices = direct;
        choices.append(&mut indirect);
        choices.append(&mut transitive);

        let labels: Vec<String> = choices
            .iter()
            .map(|m| choice_label(m, opts.time))
            .collect();

        let prompt = MultiSelect::new("Select updates to apply:", labels).with_page_size(15);

        match prompt.raw_prompt() {
            Ok(picked) => Ok(picked
                .into_iter()
                .map(|option| choices[option.index].clone())
                .collect()),
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                Ok(Vec::new())
            }
            Err(e) => Err(AppError::Selection(e.to_string())),
        }
    }
}

/// Orders modules by diff-group sort key, then path.
pub fn sort_by_group(modules: &mut [Module]) {
    modules.sort_by(|a, b| {
        format::group_sort_key(a)
            .cmp(&format::group_sort_key(b))
            .then_with(|| a.path.cmp(&b.path))
    });
}

fn choice_label(module: &Module, show_time: bool) -> String {
    let update = module.update.as_deref();
    let new_version = update.map(|u| u.version.as_str()).unwrap_or("?");

    let mut label = format!(
        "{}  {} → {}  [{}]",
        module.path,
        module.version,
        new_version,
        format::group_label(module)
    );

    if show_time {
        if let Some(published) =
            update.and_then(|u| format::publish_time(&u.time, Utc::now()))
        {
            label.push_str(&format!("  {}", published));
        }
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, current: &str, update: &str) -> Module {
        Module {
            path: path.to_string(),
            version: current.to_string(),
            update: Some(Box::new(Module {
                path: path.to_string(),
                version: update.to_string(),
                time: "2026-01-01T00:00:00Z".to_string(),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_by_group_orders_major_first() {
        let mut modules = vec![
            module("patch.example/a", "v1.0.0", "v1.0.1"),
            module("major.example/b", "v1.0.0", "v2.0.0"),
            module("minor.example/c", "v1.0.0", "v1.1.0"),
        ];
        sort_by_group(&mut modules);
        let paths: Vec<&str> = modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["major.example/b", "minor.example/c", "patch.example/a"]
        );
    }

    #[test]
    fn test_sort_by_group_ties_break_on_path() {
        let mut modules = vec![
            module("z.example/a", "v1.0.0", "v2.0.0"),
            module("a.example/z", "v1.0.0", "v2.0.0"),
        ];
        sort_by_group(&mut modules);
        assert_eq!(modules[0].path, "a.example/z");
    }

    #[test]
    fn test_choice_label_contains_versions_and_group() {
        let m = module("github.com/a/b", "v1.0.0", "v1.1.0");
        let label = choice_label(&m, false);
        assert!(label.contains("github.com/a/b"));
        assert!(label.contains("v1.0.0 → v1.1.0"));
        assert!(label.contains("[Minor]"));
    }

    #[test]
    fn test_choice_label_with_time() {
        let m = module("github.com/a/b", "v1.0.0", "v1.1.0");
        let label = choice_label(&m, true);
        assert!(label.contains("2026-01-01"));
        assert!(label.contains("d ago)"));
    }

    #[test]
    fn test_choice_label_without_update() {
        let m = Module {
            path: "github.com/a/b".to_string(),
            version: "v1.0.0".to_string(),
            ..Default::default()
        };
        let label = choice_label(&m, false);
        assert!(label.contains("→ ?"));
        assert!(label.contains("[Unknown]"));
    }
}
