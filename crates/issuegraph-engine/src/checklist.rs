//! Parent body rewriting: one checklist line per child.

use issuegraph_types::Repository;

use crate::config::ChecklistConfig;

/// What the engine knows about a child when its parent is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRef<'a> {
    /// Created in this run or resumed from a prior one.
    Linked { title: &'a str, url: &'a str },
    Failed { title: &'a str },
}

/// `(owner, name, number)` of a GitHub issue or pull request URL.
fn short_ref(url: &str) -> Option<(&str, &str, u64)> {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let number = segments.next()?.parse::<u64>().ok()?;
    let kind = segments.next()?;
    if kind != "issues" && kind != "pull" {
        return None;
    }
    let name = segments.next().filter(|s| !s.is_empty())?;
    let owner = segments.next().filter(|s| !s.is_empty())?;
    Some((owner, name, number))
}

/// One markdown task line for `child`, referenced from a parent that lives
/// in `parent_repo`.
#[must_use]
pub fn render_line(parent_repo: &Repository, child: ChildRef<'_>) -> String {
    match child {
        ChildRef::Failed { title } => format!("- [ ] (Failed) {title}"),
        ChildRef::Linked { title, url } => match short_ref(url) {
            Some((owner, name, number))
                if owner.eq_ignore_ascii_case(&parent_repo.owner)
                    && name.eq_ignore_ascii_case(&parent_repo.name) =>
            {
                format!("- [ ] #{number} {title}")
            }
            Some((owner, name, number)) => format!("- [ ] {owner}/{name}#{number} {title}"),
            None => format!("- [ ] [{title}]({url})"),
        },
    }
}

/// Rewrite `body` with `lines`. The first occurrence of the configured
/// marker is replaced; without a marker the checklist is appended under
/// the heading. A body with no child lines is returned unchanged.
#[must_use]
pub fn render_body(body: &str, lines: &[String], config: &ChecklistConfig) -> String {
    if lines.is_empty() {
        return body.to_string();
    }
    let list = lines.join("\n");
    if body.contains(&config.marker) {
        return body.replacen(&config.marker, &list, 1);
    }
    format!("{body}\n\n{}\n{list}", config.heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(owner: &str, name: &str) -> Repository {
        Repository {
            owner: owner.into(),
            name: name.into(),
        }
    }

    #[test]
    fn same_repository_uses_bare_number() {
        let line = render_line(
            &repo("acme", "app"),
            ChildRef::Linked {
                title: "Login form",
                url: "https://github.com/acme/app/issues/42",
            },
        );
        assert_eq!(line, "- [ ] #42 Login form");
    }

    #[test]
    fn other_repository_is_qualified() {
        let line = render_line(
            &repo("acme", "app"),
            ChildRef::Linked {
                title: "API endpoint",
                url: "https://github.com/acme/api/issues/7/",
            },
        );
        assert_eq!(line, "- [ ] acme/api#7 API endpoint");
    }

    #[test]
    fn url_without_number_becomes_link() {
        let line = render_line(
            &repo("acme", "app"),
            ChildRef::Linked {
                title: "Odd",
                url: "https://tracker.example/items/abc",
            },
        );
        assert_eq!(line, "- [ ] [Odd](https://tracker.example/items/abc)");
    }

    #[test]
    fn failed_child_is_plain_text() {
        let line = render_line(&repo("acme", "app"), ChildRef::Failed { title: "Broken" });
        assert_eq!(line, "- [ ] (Failed) Broken");
    }

    #[test]
    fn checklist_is_appended_under_heading() {
        let body = render_body(
            "Line one\nLine two",
            &["- [ ] #1 A".into(), "- [ ] #2 B".into()],
            &ChecklistConfig::default(),
        );
        assert_eq!(
            body,
            "Line one\nLine two\n\n### Child Issues\n- [ ] #1 A\n- [ ] #2 B"
        );
    }

    #[test]
    fn marker_is_replaced_in_place() {
        let body = render_body(
            "Intro\n{{children}}\nOutro",
            &["- [ ] #1 A".into()],
            &ChecklistConfig::default(),
        );
        assert_eq!(body, "Intro\n- [ ] #1 A\nOutro");
    }

    #[test]
    fn leaf_body_is_untouched() {
        let body = render_body("Just me {{children}}", &[], &ChecklistConfig::default());
        assert_eq!(body, "Just me {{children}}");
    }
}
