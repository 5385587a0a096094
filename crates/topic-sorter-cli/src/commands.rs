use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "topic-sorter")]
#[command(about = "Sort files into topic folders by filename keywords and a trained classifier", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to Config.* in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Cluster, score and move files from the source folders into the destination
    Sort {
        /// Train the classifier before sorting
        #[arg(long)]
        train: bool,
    },
    /// Rebuild the associations file from the destination folder tree
    Associate {
        /// Add the words of each folder name to its keywords
        #[arg(long)]
        name_terms: bool,
    },
    /// Check the training set by training a classifier once
    ///
    /// The model only lives for this command and is discarded afterwards; use
    /// `sort --train` to sort with a trained model.
    Train,
    /// Show how filenames would be scored, without moving anything
    Explain {
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Print configuration values
    PrintConfig,
}
