use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "otu-pipelines", version = "0.1.0")]
pub struct Arguments {
    #[arg(short = 'i', long = "input-fp", help = "Input sequence fasta, post split-libraries")]
    pub input_fp: String,

    #[arg(short = 'o', long = "output-dir", help = "Output directory for all generated files; one subdirectory per executed step")]
    pub output_dir: String,

    #[arg(short = 'p', long = "parameter-fp", help = "Path to the parameter override file")]
    pub parameter_fp: String,

    #[arg(short = 'f', long = "force", action, help = "Force overwrite of an existing output directory (existing files in it will not be removed)")]
    pub force: bool,

    #[arg(short = 'w', long = "print-only", action, help = "Print the commands but don't call them; useful for debugging")]
    pub print_only: bool,

    #[arg(short = 'a', long = "parallel", action, help = "Run in parallel where available")]
    pub parallel: bool,

    #[arg(short = 's', long = "sff-fp", help = "Raw flowgram sff file; required for denoising")]
    pub sff_fp: Option<String>,

    #[arg(short = 'm', long = "mapping-fp", help = "Metadata mapping file; required for denoising")]
    pub mapping_fp: Option<String>,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(long, default_value_t = 2, help = "Number of jobs handed to the parallel backend")]
    pub jobs: usize,
}
