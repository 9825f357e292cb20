//! Batch script rendering
//!
//! A job script is a user template with `{key}` placeholders filled in,
//! followed by two fixed lines that print the completion sentinel once the
//! job's own commands have finished.

use std::collections::HashMap;

use crate::domain::job::JobName;
use crate::error::TemplateError;

/// Marker line that ends watching of a job's output
pub const SENTINEL: &str = "[SBATCH-DONE]";

/// Appended verbatim to every rendered template
const SCRIPT_TRAILER: &str = "echo\n echo \"[SBATCH-DONE]\"\n";

/// Placeholder always bound to the job name
const NAME_KEY: &str = "name";

/// A rendered batch script ready to be written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    text: String,
}

impl JobScript {
    /// Renders `template` for `name`
    ///
    /// `{name}` is bound to the job name and overrides any `name` entry in
    /// `vars`. `{{` and `}}` produce literal braces.
    pub fn render(
        template: &str,
        name: &JobName,
        vars: &HashMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let mut text = substitute(template, |key| {
            if key == NAME_KEY {
                Some(name.as_str())
            } else {
                vars.get(key).map(String::as_str)
            }
        })?;
        text.push_str(SCRIPT_TRAILER);
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn substitute<'a>(
    template: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template.char_indices().peekable();

    while let Some((pos, c)) = rest.next() {
        match c {
            '{' if matches!(rest.peek(), Some((_, '{'))) => {
                rest.next();
                out.push('{');
            }
            '{' => {
                let start = pos + 1;
                let end = template[start..]
                    .find('}')
                    .map(|offset| start + offset)
                    .ok_or(TemplateError::Unclosed(pos))?;
                let key = &template[start..end];
                let value = lookup(key).ok_or_else(|| TemplateError::UnknownKey(key.to_string()))?;
                out.push_str(value);
                while rest.peek().is_some_and(|(i, _)| *i <= end) {
                    rest.next();
                }
            }
            '}' if matches!(rest.peek(), Some((_, '}'))) => {
                rest.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::StrayClose(pos)),
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    #[test]
    fn test_render_appends_trailer() {
        let script = JobScript::render("run --x\n", &job("job1"), &HashMap::new()).unwrap();
        assert_eq!(script.as_str(), "run --x\necho\n echo \"[SBATCH-DONE]\"\n");
    }

    #[test]
    fn test_render_substitutes_name_and_vars() {
        let mut vars = HashMap::new();
        vars.insert("partition".to_string(), "gpu".to_string());
        vars.insert("name".to_string(), "ignored".to_string());

        let template = "#SBATCH -p {partition}\npython train.py --tag {name}\n";
        let script = JobScript::render(template, &job("train"), &vars).unwrap();

        assert_eq!(
            script.as_str(),
            "#SBATCH -p gpu\npython train.py --tag train\necho\n echo \"[SBATCH-DONE]\"\n"
        );
    }

    #[test]
    fn test_render_escaped_braces() {
        let template = "awk '{{print $1}}' {name}.txt\n";
        let script = JobScript::render(template, &job("data"), &HashMap::new()).unwrap();
        assert!(script.as_str().starts_with("awk '{print $1}' data.txt\n"));
    }

    #[test]
    fn test_render_keeps_unicode() {
        let script = JobScript::render("echo «{name}»\n", &job("j"), &HashMap::new()).unwrap();
        assert!(script.as_str().starts_with("echo «j»\n"));
    }

    #[test]
    fn test_render_errors() {
        let vars = HashMap::new();
        assert_eq!(
            JobScript::render("{missing}", &job("a"), &vars).unwrap_err(),
            TemplateError::UnknownKey("missing".to_string())
        );
        assert_eq!(
            JobScript::render("echo {name", &job("a"), &vars).unwrap_err(),
            TemplateError::Unclosed(5)
        );
        assert_eq!(
            JobScript::render("echo }", &job("a"), &vars).unwrap_err(),
            TemplateError::StrayClose(5)
        );
    }

    #[test]
    fn test_sentinel_matches_trailer() {
        assert!(SCRIPT_TRAILER.contains(SENTINEL));
    }
}
