//! # Tree DP command line tool
//!
//! Computes the disparity map of a stereo pair and writes it as a normalised greyscale image.
//!
//! Usage: `tree-dp <left> <right> <output> [params.json]`

use std::process;

use cv_tree_disparity::prelude::*;
use log::info;

fn usage() {
    eprintln!("Usage: tree-dp <left> <right> <output> [params.json]");
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let params = match args.get(3) {
        Some(path) => Params::from_file(path)?,
        None => Params::default()
    };
    info!("Parameters: {:?}", params);

    let left = image::open(&args[0])?.to_rgb();
    let right = image::open(&args[1])?.to_rgb();

    let mut disp = TreeDp::new(params);
    let map = disp.compute(&StereoFrame::new(left, right))?;

    info!(
        "Disparity range {:?}..{:?}, writing {}",
        map.min_disp,
        map.max_disp,
        args[2]
    );
    map.to_luma_normalised().save(&args[2])?;

    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        usage();
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
