use std::sync::Arc;

use log::{debug, info};

use crate::config::defs::{PipelineError, RunConfig, StepName};
use crate::utils::command::{self, PlannedCommand};
use crate::utils::exec::ExecutionPolicy;
use crate::utils::file::{ensure_step_dir, input_basename, prepare_output_dir};
use crate::utils::status::StatusReporter;

/// Plans the ordered command list for a run.
///
/// Denoising is enabled only when both the sff and mapping inputs are
/// present; supplying exactly one of the two is a preflight error raised
/// before any command is built. Every later step is unconditional and
/// consumes a declared output of an earlier step, so the list always comes
/// out in the same fixed order. Each enabled step's subdirectory is created
/// here as its command is constructed; a skipped step leaves nothing on
/// disk.
pub fn plan(config: &RunConfig) -> Result<Vec<PlannedCommand>, PipelineError> {
    let mut commands: Vec<PlannedCommand> = Vec::new();
    let jobs = config.args.jobs;

    let seqs_fp = match (&config.sff_fp, &config.mapping_fp) {
        (Some(sff_fp), Some(mapping_fp)) => {
            let dir = ensure_step_dir(&config.out_dir, StepName::Denoise)?;
            let invocation = command::denoise::build(
                &dir,
                sff_fp,
                &config.input_fp,
                mapping_fp,
                &config.params.resolved(StepName::Denoise),
            );
            commands.push(PlannedCommand {
                invocation,
                parallel: None,
            });
            command::denoise::output_path(&dir)
        }
        (None, None) => config.input_fp.clone(),
        _ => return Err(PipelineError::InconsistentDenoiseInputs),
    };

    let base = input_basename(&seqs_fp);

    let dir = ensure_step_dir(&config.out_dir, StepName::PickOtus)?;
    let otu_fp = command::pick_otus::output_path(&dir, &base);
    commands.push(PlannedCommand {
        invocation: command::pick_otus::build(&dir, &seqs_fp, &config.params.resolved(StepName::PickOtus)),
        parallel: None,
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::PickRepSet)?;
    let rep_set_fp = command::pick_rep_set::output_path(&dir, &base);
    commands.push(PlannedCommand {
        invocation: command::pick_rep_set::build(
            &dir,
            &otu_fp,
            &seqs_fp,
            &base,
            &config.params.resolved(StepName::PickRepSet),
        ),
        parallel: None,
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::AlignSeqs)?;
    let aligned_fp = command::align_seqs::output_path(&dir, &rep_set_fp);
    let align_params = config.params.resolved(StepName::AlignSeqs);
    commands.push(PlannedCommand {
        invocation: command::align_seqs::build(&dir, &rep_set_fp, &align_params),
        parallel: Some(command::align_seqs::build_parallel(&dir, &rep_set_fp, &align_params, jobs)),
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::AssignTaxonomy)?;
    let taxonomy_fp = command::assign_taxonomy::output_path(&dir, &rep_set_fp);
    let taxonomy_params = config.params.resolved(StepName::AssignTaxonomy);
    commands.push(PlannedCommand {
        invocation: command::assign_taxonomy::build(&dir, &rep_set_fp, &taxonomy_params),
        parallel: Some(command::assign_taxonomy::build_parallel(
            &dir,
            &rep_set_fp,
            &taxonomy_params,
            jobs,
        )),
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::FilterAlignment)?;
    let filtered_fp = command::filter_alignment::output_path(&dir, &aligned_fp);
    commands.push(PlannedCommand {
        invocation: command::filter_alignment::build(
            &dir,
            &aligned_fp,
            &config.params.resolved(StepName::FilterAlignment),
        ),
        parallel: None,
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::MakePhylogeny)?;
    commands.push(PlannedCommand {
        invocation: command::make_phylogeny::build(
            &dir,
            &filtered_fp,
            &config.params.resolved(StepName::MakePhylogeny),
        ),
        parallel: None,
    });

    let dir = ensure_step_dir(&config.out_dir, StepName::MakeOtuTable)?;
    commands.push(PlannedCommand {
        invocation: command::make_otu_table::build(
            &dir,
            &otu_fp,
            &taxonomy_fp,
            &config.params.resolved(StepName::MakeOtuTable),
        ),
        parallel: None,
    });

    Ok(commands)
}

/// Runs the workflow end to end.
///
/// The root output directory is prepared first (an existing directory
/// without `-f` is fatal before anything is planned), then the planned
/// command list is handed to the chosen policy.
pub async fn run(
    config: Arc<RunConfig>,
    policy: &dyn ExecutionPolicy,
    reporter: &dyn StatusReporter,
) -> Result<(), PipelineError> {
    prepare_output_dir(&config.out_dir, config.args.force)?;

    let commands = plan(&config)?;
    info!("Planned {} steps for {}", commands.len(), config.input_fp.display());
    for planned in &commands {
        debug!("  {}", planned.invocation.render());
    }

    policy.execute(&commands, reporter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::cli::Arguments;
    use crate::config::params::ParameterStore;
    use crate::utils::file::step_dir;

    fn test_config(tmp: &TempDir, denoise: bool) -> RunConfig {
        let input_fp = tmp.path().join("inseqs1.fasta");
        fs::write(&input_fp, ">sample1_1\nACGTACGT\n").unwrap();

        let (sff_fp, mapping_fp) = if denoise {
            let sff = tmp.path().join("inseqs1.sff.txt");
            let mapping = tmp.path().join("mapping.txt");
            fs::write(&sff, "Common Header:\n").unwrap();
            fs::write(&mapping, "#SampleID\tBarcode\n").unwrap();
            (Some(sff), Some(mapping))
        } else {
            (None, None)
        };

        let mut args = Arguments::default();
        args.jobs = 2;

        RunConfig {
            cwd: tmp.path().to_path_buf(),
            input_fp,
            out_dir: tmp.path().join("wf"),
            sff_fp,
            mapping_fp,
            params: ParameterStore::parse("").unwrap(),
            args,
        }
    }

    fn arg_value<'a>(invocation: &'a command::CommandInvocation, flag: &str) -> &'a str {
        let pos = invocation
            .args
            .iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("{} missing from {:?}", flag, invocation.args));
        &invocation.args[pos + 1]
    }

    #[test]
    fn test_plan_without_denoising_yields_seven_steps() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, false);

        let commands = plan(&config).unwrap();
        let steps: Vec<StepName> = commands.iter().map(|c| c.invocation.step).collect();
        assert_eq!(
            steps,
            vec![
                StepName::PickOtus,
                StepName::PickRepSet,
                StepName::AlignSeqs,
                StepName::AssignTaxonomy,
                StepName::FilterAlignment,
                StepName::MakePhylogeny,
                StepName::MakeOtuTable,
            ]
        );
        assert_eq!(
            arg_value(&commands[0].invocation, "-i"),
            config.input_fp.to_string_lossy().as_ref()
        );
    }

    #[test]
    fn test_plan_with_denoising_yields_eight_steps() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, true);

        let commands = plan(&config).unwrap();
        assert_eq!(commands.len(), 8);
        assert_eq!(commands[0].invocation.step, StepName::Denoise);

        // Clustering consumes the denoiser's declared output.
        let denoised = command::denoise::output_path(&step_dir(&config.out_dir, StepName::Denoise));
        assert_eq!(
            arg_value(&commands[1].invocation, "-i"),
            denoised.to_string_lossy().as_ref()
        );
    }

    #[test]
    fn test_plan_rejects_sff_without_mapping() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp, true);
        config.mapping_fp = None;

        let err = plan(&config).unwrap_err();
        assert!(matches!(err, PipelineError::InconsistentDenoiseInputs));
    }

    #[test]
    fn test_plan_rejects_mapping_without_sff() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp, true);
        config.sff_fp = None;

        let err = plan(&config).unwrap_err();
        assert!(matches!(err, PipelineError::InconsistentDenoiseInputs));
    }

    #[test]
    fn test_chain_continuity() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, false);

        let commands = plan(&config).unwrap();
        let out = &config.out_dir;
        let base = "inseqs1";

        let otu_fp = command::pick_otus::output_path(&step_dir(out, StepName::PickOtus), base);
        let rep_set_fp = command::pick_rep_set::output_path(&step_dir(out, StepName::PickRepSet), base);
        let aligned_fp = command::align_seqs::output_path(&step_dir(out, StepName::AlignSeqs), &rep_set_fp);
        let taxonomy_fp =
            command::assign_taxonomy::output_path(&step_dir(out, StepName::AssignTaxonomy), &rep_set_fp);
        let filtered_fp =
            command::filter_alignment::output_path(&step_dir(out, StepName::FilterAlignment), &aligned_fp);

        let expect = |invocation: &command::CommandInvocation, flag: &str, path: &Path| {
            assert_eq!(
                arg_value(invocation, flag),
                path.to_string_lossy().as_ref(),
                "step {}",
                invocation.step
            );
        };

        expect(&commands[1].invocation, "-i", &otu_fp);
        expect(&commands[2].invocation, "-i", &rep_set_fp);
        expect(&commands[3].invocation, "-i", &rep_set_fp);
        expect(&commands[4].invocation, "-i", &aligned_fp);
        expect(&commands[5].invocation, "-i", &filtered_fp);
        expect(&commands[6].invocation, "-i", &otu_fp);
        expect(&commands[6].invocation, "-t", &taxonomy_fp);
    }

    #[test]
    fn test_skipped_denoise_creates_no_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, false);

        plan(&config).unwrap();
        assert!(!step_dir(&config.out_dir, StepName::Denoise).exists());
        assert!(step_dir(&config.out_dir, StepName::PickOtus).is_dir());
    }

    #[test]
    fn test_only_alignment_and_taxonomy_carry_parallel_variants() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, false);

        for planned in plan(&config).unwrap() {
            let expected = planned.invocation.step.parallel_program().is_some();
            assert_eq!(planned.parallel.is_some(), expected, "step {}", planned.invocation.step);
        }
    }

    #[test]
    fn test_overrides_reach_the_rendered_command() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp, false);
        config.params =
            ParameterStore::parse("pick_otus:similarity 0.99\nalign_seqs:template_fp /refs/core.fasta\n")
                .unwrap();

        let commands = plan(&config).unwrap();
        assert_eq!(arg_value(&commands[0].invocation, "--similarity"), "0.99");
        assert_eq!(arg_value(&commands[2].invocation, "--template_fp"), "/refs/core.fasta");
        // Untouched defaults still apply.
        assert_eq!(arg_value(&commands[0].invocation, "--otu_picking_method"), "uclust");
    }
}
