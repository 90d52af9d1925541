use std::collections::{BTreeMap, HashMap};

use crate::config::defs::{DEFAULT_PARAMETERS, PipelineError, StepName};

/// Parsed parameter overrides, step name -> option name -> value.
///
/// Built once from the parameter file before any step runs and immutable
/// afterwards. Option values are opaque strings forwarded verbatim to the
/// wrapped tools; nothing here validates them.
#[derive(Debug, Default)]
pub struct ParameterStore {
    overrides: HashMap<String, HashMap<String, String>>,
}

impl ParameterStore {
    /// Parses the parameter file contents.
    ///
    /// One override per line, `step_name:option_name <value>`. Blank lines
    /// and `#` comments are skipped. A line whose first field lacks the `:`
    /// separator is a fatal parse error carrying the 1-based line number.
    /// If the same (step, option) pair appears more than once, the last
    /// occurrence wins.
    pub fn parse(contents: &str) -> Result<Self, PipelineError> {
        let mut overrides: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let key = fields.next().unwrap_or_default();
            let (step, option) = match key.split_once(':') {
                Some((step, option)) if !step.is_empty() && !option.is_empty() => (step, option),
                _ => {
                    return Err(PipelineError::ParameterParse {
                        line_no: idx + 1,
                        line: raw.to_string(),
                    });
                }
            };
            let value = fields.collect::<Vec<_>>().join(" ");

            overrides
                .entry(step.to_string())
                .or_default()
                .insert(option.to_string(), value);
        }

        Ok(ParameterStore { overrides })
    }

    /// Looks up a single override, falling back to the caller's default when
    /// the (step, option) pair is absent from the parameter file.
    pub fn get<'a>(&'a self, step: StepName, option: &str, default: &'a str) -> &'a str {
        self.overrides
            .get(step.as_str())
            .and_then(|opts| opts.get(option))
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// The full parameter set for a step: the static per-step defaults
    /// overlaid by the user's overrides, ordered by option name so the
    /// argument lists built from it are deterministic.
    pub fn resolved(&self, step: StepName) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();

        if let Some(defaults) = DEFAULT_PARAMETERS.get(step.as_str()) {
            for (option, value) in defaults {
                merged.insert(option.to_string(), value.to_string());
            }
        }
        if let Some(opts) = self.overrides.get(step.as_str()) {
            for (option, value) in opts {
                merged.insert(option.clone(), value.clone());
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_lookup() {
        let store = ParameterStore::parse("pick_otus:similarity 0.99\n").unwrap();
        assert_eq!(store.get(StepName::PickOtus, "similarity", "0.97"), "0.99");
    }

    #[test]
    fn test_absent_pair_returns_default() {
        let store = ParameterStore::parse("").unwrap();
        assert_eq!(store.get(StepName::AlignSeqs, "template_fp", "core.fasta"), "core.fasta");
    }

    #[test]
    fn test_last_write_wins() {
        let store = ParameterStore::parse(
            "pick_otus:similarity 0.95\npick_otus:similarity 0.99\n",
        )
        .unwrap();
        assert_eq!(store.get(StepName::PickOtus, "similarity", ""), "0.99");
    }

    #[test]
    fn test_blank_lines_and_comments_skipped() {
        let store = ParameterStore::parse(
            "# pipeline overrides\n\nalign_seqs:template_fp /refs/core.fasta\n",
        )
        .unwrap();
        assert_eq!(store.get(StepName::AlignSeqs, "template_fp", ""), "/refs/core.fasta");
    }

    #[test]
    fn test_missing_separator_is_fatal() {
        let err = ParameterStore::parse("pick_otus 0.99\n").unwrap_err();
        match err {
            PipelineError::ParameterParse { line_no, line } => {
                assert_eq!(line_no, 1);
                assert_eq!(line, "pick_otus 0.99");
            }
            other => panic!("expected ParameterParse, got {:?}", other),
        }
    }

    #[test]
    fn test_value_may_contain_spaces() {
        let store = ParameterStore::parse("assign_taxonomy:rdp_classifier java -Xmx1g\n").unwrap();
        assert_eq!(store.get(StepName::AssignTaxonomy, "rdp_classifier", ""), "java -Xmx1g");
    }

    #[test]
    fn test_resolved_merges_defaults_under_overrides() {
        let store = ParameterStore::parse("pick_otus:similarity 0.99\n").unwrap();
        let resolved = store.resolved(StepName::PickOtus);
        assert_eq!(resolved.get("similarity").map(String::as_str), Some("0.99"));
        assert_eq!(resolved.get("otu_picking_method").map(String::as_str), Some("uclust"));
    }

    #[test]
    fn test_resolved_is_ordered_by_option() {
        let store = ParameterStore::parse(
            "denoise:primer CATGCTGCCTCCCGTAGGAGT\ndenoise:num_cpus 4\n",
        )
        .unwrap();
        let options: Vec<_> = store.resolved(StepName::Denoise).into_keys().collect();
        assert_eq!(options, vec!["num_cpus".to_string(), "primer".to_string()]);
    }
}
