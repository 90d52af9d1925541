use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::cli::Arguments;
use crate::config::params::ParameterStore;

// External software
pub const DENOISE_TAG: &str = "denoise.py";
pub const PICK_OTUS_TAG: &str = "pick_otus.py";
pub const PICK_REP_SET_TAG: &str = "pick_rep_set.py";
pub const ALIGN_SEQS_TAG: &str = "align_seqs.py";
pub const PARALLEL_ALIGN_SEQS_TAG: &str = "parallel_align_seqs_pynast.py";
pub const ASSIGN_TAXONOMY_TAG: &str = "assign_taxonomy.py";
pub const PARALLEL_ASSIGN_TAXONOMY_TAG: &str = "parallel_assign_taxonomy_rdp.py";
pub const FILTER_ALIGNMENT_TAG: &str = "filter_alignment.py";
pub const MAKE_PHYLOGENY_TAG: &str = "make_phylogeny.py";
pub const MAKE_OTU_TABLE_TAG: &str = "make_otu_table.py";

lazy_static! {
    /// Per-step defaults applied underneath the user's parameter file.
    pub static ref DEFAULT_PARAMETERS: HashMap<&'static str, Vec<(&'static str, &'static str)>> = {
        let mut m = HashMap::new();
        m.insert("pick_otus", vec![("otu_picking_method", "uclust"), ("similarity", "0.97")]);
        m.insert("pick_rep_set", vec![("rep_set_picking_method", "most_abundant")]);
        m.insert("align_seqs", vec![("alignment_method", "pynast")]);
        m.insert("assign_taxonomy", vec![("assignment_method", "rdp")]);
        m.insert("make_phylogeny", vec![("tree_method", "fasttree")]);
        m
    };
}

/// The closed set of workflow steps, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepName {
    Denoise,
    PickOtus,
    PickRepSet,
    AlignSeqs,
    AssignTaxonomy,
    FilterAlignment,
    MakePhylogeny,
    MakeOtuTable,
}

impl StepName {
    /// Step identifier, also the name of the step's output subdirectory
    /// and the step key used in the parameter file.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Denoise => "denoise",
            StepName::PickOtus => "pick_otus",
            StepName::PickRepSet => "pick_rep_set",
            StepName::AlignSeqs => "align_seqs",
            StepName::AssignTaxonomy => "assign_taxonomy",
            StepName::FilterAlignment => "filter_alignment",
            StepName::MakePhylogeny => "make_phylogeny",
            StepName::MakeOtuTable => "make_otu_table",
        }
    }

    /// The wrapped tool invoked for this step.
    pub fn program(&self) -> &'static str {
        match self {
            StepName::Denoise => DENOISE_TAG,
            StepName::PickOtus => PICK_OTUS_TAG,
            StepName::PickRepSet => PICK_REP_SET_TAG,
            StepName::AlignSeqs => ALIGN_SEQS_TAG,
            StepName::AssignTaxonomy => ASSIGN_TAXONOMY_TAG,
            StepName::FilterAlignment => FILTER_ALIGNMENT_TAG,
            StepName::MakePhylogeny => MAKE_PHYLOGENY_TAG,
            StepName::MakeOtuTable => MAKE_OTU_TABLE_TAG,
        }
    }

    /// The partitioned variant of the wrapped tool, for the steps that ship
    /// one. Eligibility is a static capability of the step, never probed at
    /// runtime.
    pub fn parallel_program(&self) -> Option<&'static str> {
        match self {
            StepName::AlignSeqs => Some(PARALLEL_ALIGN_SEQS_TAG),
            StepName::AssignTaxonomy => Some(PARALLEL_ASSIGN_TAXONOMY_TAG),
            _ => None,
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("output directory {} already exists; choose a different directory or force overwrite with -f", .0.display())]
    DirectoryConflict(PathBuf),

    #[error("malformed parameter line {line_no}: {line:?} (expected 'step:option value')")]
    ParameterParse { line_no: usize, line: String },

    #[error("the sff and mapping files are only required when denoising, and both must be provided in that case")]
    InconsistentDenoiseInputs,

    #[error("step {step} ({program}) failed: {detail}")]
    StepFailed {
        step: StepName,
        program: String,
        detail: String,
    },

    #[error("parallel backend failed for step {step} ({program}): {detail}")]
    ParallelBackend {
        step: StepName,
        program: String,
        detail: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct RunConfig {
    pub cwd: PathBuf,
    pub input_fp: PathBuf,
    pub out_dir: PathBuf,
    pub sff_fp: Option<PathBuf>,
    pub mapping_fp: Option<PathBuf>,
    pub params: ParameterStore,
    pub args: Arguments,
}
