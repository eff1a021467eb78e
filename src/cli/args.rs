use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "station-charts")]
#[command(about = "Trailing 30-day precipitation and temperature charts per weather station")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render an interactive document and a static image for every station
    Generate {
        #[arg(short, long, help = "Input observations CSV")]
        input: PathBuf,

        #[arg(short, long, help = "Output folder for img_output/ and html_output/")]
        output: PathBuf,

        #[arg(long, help = "Document naming: plain | month-year")]
        naming: Option<String>,

        #[arg(long, help = "Label language: es | en")]
        locale: Option<String>,

        #[arg(long, help = "Also draw relative humidity")]
        include_humidity: bool,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, help = "Static image width in pixels")]
        width: Option<u32>,

        #[arg(long, help = "Static image height in pixels")]
        height: Option<u32>,
    },

    /// List stations in an input file without writing anything
    Stations {
        #[arg(short, long, help = "Input observations CSV")]
        input: PathBuf,
    },
}
