//! Prompt template for the per-cancer-type recommendation request.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` stand for literal
//! braces. The template and its variable names are stored in `template.json`
//! so the instruction text can be edited without rebuilding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::OncoError;

pub const VAR_CANCER_TYPE: &str = "cancer_type";
pub const VAR_ONCOTREE_CODE: &str = "oncotree_code";
pub const VAR_FORMAT_INSTRUCTIONS: &str = "format_instructions";

/// Indentation and trailing spaces are part of the template text.
pub const RECOMMENDATION_TEMPLATE: &str = concat!(
    "\n",
    "    You are a genomics expert specializing in cancer genomics. \n",
    "    Which genes and pathways are relevant for classifying {cancer_type} (OncoTree code: {oncotree_code})? \n",
    "    Consider genes that are:\n",
    "    1. Commonly mutated in this cancer type\n",
    "    2. Used for molecular subtyping\n",
    "    3. Associated with prognosis or treatment decisions\n",
    "    4. Well-established in clinical or research settings\n",
    "    Please only include well-established genes that are known to be important for the molecular \n",
    "    classification of {cancer_type}. Do not include speculative or rarely used markers.\n",
    "    {format_instructions}\n",
    "    ",
);

pub const FORMAT_INSTRUCTIONS: &str = r#"
Return a JSON object with the following structure:
{
    "mutation_based": ["Gene1", "Gene2", "Gene3"],
    "expression_based": ["GeneX", "GeneY", "GeneZ"],
    "pathways": ["PathwayA", "PathwayB"]
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub template: String,
    pub input_variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Var(&'a str),
}

impl PromptTemplate {
    /// Builds a template; placeholder names are deduplicated and sorted.
    pub fn from_template(template: &str) -> Result<Self, OncoError> {
        let input_variables = segments(template)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Var(name) => Some(name.to_string()),
                Segment::Text(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Ok(Self {
            template: template.to_string(),
            input_variables,
        })
    }

    pub fn recommendation() -> Self {
        Self {
            template: RECOMMENDATION_TEMPLATE.to_string(),
            input_variables: vec![
                VAR_CANCER_TYPE.to_string(),
                VAR_FORMAT_INSTRUCTIONS.to_string(),
                VAR_ONCOTREE_CODE.to_string(),
            ],
        }
    }

    /// Substitutes every placeholder. Each declared input variable must be
    /// supplied, and so must any placeholder the text uses.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, OncoError> {
        let lookup = |name: &str| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        };

        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| lookup(name.as_str()).is_none())
        {
            return Err(OncoError::Template(format!(
                "missing value for input variable `{missing}`"
            )));
        }

        let mut rendered = String::with_capacity(self.template.len());
        for segment in segments(&self.template)? {
            match segment {
                Segment::Text(text) => rendered.push_str(text),
                Segment::Var(name) => {
                    let value = lookup(name).ok_or_else(|| {
                        OncoError::Template(format!("missing value for placeholder `{name}`"))
                    })?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }

    /// Renders the recommendation request for one cancer type.
    pub fn render_recommendation(
        &self,
        cancer_type: &str,
        oncotree_code: &str,
    ) -> Result<String, OncoError> {
        self.render(&[
            (VAR_CANCER_TYPE, cancer_type),
            (VAR_ONCOTREE_CODE, oncotree_code),
            (VAR_FORMAT_INSTRUCTIONS, FORMAT_INSTRUCTIONS),
        ])
    }
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, OncoError> {
    let mut out = Vec::new();
    let mut rest = template;
    while !rest.is_empty() {
        let Some(pos) = rest.find(['{', '}']) else {
            out.push(Segment::Text(rest));
            break;
        };
        if pos > 0 {
            out.push(Segment::Text(&rest[..pos]));
        }
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{") {
            out.push(Segment::Text("{"));
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push(Segment::Text("}"));
            rest = after;
        } else if tail.starts_with('}') {
            return Err(OncoError::Template(format!(
                "single '}}' at byte {} must be doubled",
                template.len() - tail.len()
            )));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                OncoError::Template("unterminated placeholder".to_string())
            })?;
            let name = tail[1..end].trim();
            let is_identifier = name
                .chars()
                .next()
                .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
                && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
            if !is_identifier {
                return Err(OncoError::Template(format!(
                    "invalid placeholder `{{{}}}`",
                    &tail[1..end]
                )));
            }
            out.push(Segment::Var(name));
            rest = &tail[end + 1..];
        }
    }
    Ok(out)
}
