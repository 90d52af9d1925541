/// Functions and structs for building the wrapped tools' command lines

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defs::StepName;

/// One fully resolved external tool call. Arguments carry no placeholders;
/// everything is a literal path or value by the time this is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    pub step: StepName,
    pub program: String,
    pub args: Vec<String>,
    pub output_dir: PathBuf,
}

impl CommandInvocation {
    /// The printable command line, program first.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// A planned step: the serial invocation, plus the parallel-backend
/// alternative for the steps whose tool ships a partitioned variant.
#[derive(Debug, Clone)]
pub struct PlannedCommand {
    pub invocation: CommandInvocation,
    pub parallel: Option<CommandInvocation>,
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Appends `--option value` pairs from the resolved parameter map.
/// Options with an empty value are omitted entirely so the wrapped tool's
/// own default applies.
fn push_params(args: &mut Vec<String>, params: &BTreeMap<String, String>) {
    for (option, value) in params {
        if value.is_empty() {
            continue;
        }
        args.push(format!("--{}", option));
        args.push(value.clone());
    }
}

pub mod denoise {
    use super::*;
    use crate::config::defs::DENOISE_TAG;

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join("denoised_seqs.fasta")
    }

    pub fn build(
        dir: &Path,
        sff_fp: &Path,
        input_fp: &Path,
        mapping_fp: &Path,
        params: &BTreeMap<String, String>,
    ) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(sff_fp),
            "-f".to_string(),
            path_str(input_fp),
            "-m".to_string(),
            path_str(mapping_fp),
            "-o".to_string(),
            path_str(dir),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::Denoise,
            program: DENOISE_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod pick_otus {
    use super::*;
    use crate::config::defs::PICK_OTUS_TAG;

    /// The OTU map, named after the input sequence file.
    pub fn output_path(dir: &Path, base: &str) -> PathBuf {
        dir.join(format!("{}_otus.txt", base))
    }

    pub fn build(dir: &Path, input_fp: &Path, params: &BTreeMap<String, String>) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(input_fp),
            "-o".to_string(),
            path_str(dir),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::PickOtus,
            program: PICK_OTUS_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod pick_rep_set {
    use super::*;
    use crate::config::defs::PICK_REP_SET_TAG;

    pub fn output_path(dir: &Path, base: &str) -> PathBuf {
        dir.join(format!("{}_rep_set.fasta", base))
    }

    pub fn build(
        dir: &Path,
        otu_fp: &Path,
        input_fp: &Path,
        base: &str,
        params: &BTreeMap<String, String>,
    ) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(otu_fp),
            "-f".to_string(),
            path_str(input_fp),
            "-o".to_string(),
            path_str(&output_path(dir, base)),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::PickRepSet,
            program: PICK_REP_SET_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod align_seqs {
    use super::*;
    use crate::config::defs::{ALIGN_SEQS_TAG, PARALLEL_ALIGN_SEQS_TAG};
    use crate::utils::file::input_basename;

    /// The alignment, named after the representative set file.
    pub fn output_path(dir: &Path, rep_set_fp: &Path) -> PathBuf {
        dir.join(format!("{}_aligned.fasta", input_basename(rep_set_fp)))
    }

    fn io_args(dir: &Path, rep_set_fp: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            path_str(rep_set_fp),
            "-o".to_string(),
            path_str(dir),
        ]
    }

    pub fn build(dir: &Path, rep_set_fp: &Path, params: &BTreeMap<String, String>) -> CommandInvocation {
        let mut args = io_args(dir, rep_set_fp);
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::AlignSeqs,
            program: ALIGN_SEQS_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }

    /// The partitioned variant. The backend decides how to split the input;
    /// this side only hands it the worker count.
    pub fn build_parallel(
        dir: &Path,
        rep_set_fp: &Path,
        params: &BTreeMap<String, String>,
        jobs: usize,
    ) -> CommandInvocation {
        let mut args = io_args(dir, rep_set_fp);
        args.push("-O".to_string());
        args.push(jobs.to_string());
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::AlignSeqs,
            program: PARALLEL_ALIGN_SEQS_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod assign_taxonomy {
    use super::*;
    use crate::config::defs::{ASSIGN_TAXONOMY_TAG, PARALLEL_ASSIGN_TAXONOMY_TAG};
    use crate::utils::file::input_basename;

    pub fn output_path(dir: &Path, rep_set_fp: &Path) -> PathBuf {
        dir.join(format!("{}_tax_assignments.txt", input_basename(rep_set_fp)))
    }

    fn io_args(dir: &Path, rep_set_fp: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            path_str(rep_set_fp),
            "-o".to_string(),
            path_str(dir),
        ]
    }

    pub fn build(dir: &Path, rep_set_fp: &Path, params: &BTreeMap<String, String>) -> CommandInvocation {
        let mut args = io_args(dir, rep_set_fp);
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::AssignTaxonomy,
            program: ASSIGN_TAXONOMY_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }

    pub fn build_parallel(
        dir: &Path,
        rep_set_fp: &Path,
        params: &BTreeMap<String, String>,
        jobs: usize,
    ) -> CommandInvocation {
        let mut args = io_args(dir, rep_set_fp);
        args.push("-O".to_string());
        args.push(jobs.to_string());
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::AssignTaxonomy,
            program: PARALLEL_ASSIGN_TAXONOMY_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod filter_alignment {
    use super::*;
    use crate::config::defs::FILTER_ALIGNMENT_TAG;
    use crate::utils::file::input_basename;

    pub fn output_path(dir: &Path, aligned_fp: &Path) -> PathBuf {
        dir.join(format!("{}_pfiltered.fasta", input_basename(aligned_fp)))
    }

    pub fn build(dir: &Path, aligned_fp: &Path, params: &BTreeMap<String, String>) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(aligned_fp),
            "-o".to_string(),
            path_str(dir),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::FilterAlignment,
            program: FILTER_ALIGNMENT_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod make_phylogeny {
    use super::*;
    use crate::config::defs::MAKE_PHYLOGENY_TAG;
    use crate::utils::file::input_basename;

    pub fn output_path(dir: &Path, filtered_fp: &Path) -> PathBuf {
        dir.join(format!("{}.tre", input_basename(filtered_fp)))
    }

    pub fn build(dir: &Path, filtered_fp: &Path, params: &BTreeMap<String, String>) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(filtered_fp),
            "-o".to_string(),
            path_str(&output_path(dir, filtered_fp)),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::MakePhylogeny,
            program: MAKE_PHYLOGENY_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}

pub mod make_otu_table {
    use super::*;
    use crate::config::defs::MAKE_OTU_TABLE_TAG;

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join("otu_table.txt")
    }

    pub fn build(
        dir: &Path,
        otu_fp: &Path,
        taxonomy_fp: &Path,
        params: &BTreeMap<String, String>,
    ) -> CommandInvocation {
        let mut args = vec![
            "-i".to_string(),
            path_str(otu_fp),
            "-t".to_string(),
            path_str(taxonomy_fp),
            "-o".to_string(),
            path_str(&output_path(dir)),
        ];
        push_params(&mut args, params);
        CommandInvocation {
            step: StepName::MakeOtuTable,
            program: MAKE_OTU_TABLE_TAG.to_string(),
            args,
            output_dir: dir.to_path_buf(),
        }
    }
}
