use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Frame counting progress bar, or a spinner when the total is unknown.
pub fn create_progress_bar(
    multi: &MultiProgress,
    total_frames: Option<u64>,
    message: &'static str,
) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_frames {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
        )?);
        pb
    };

    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

/// Advances an optional progress bar every 100 frames.
pub fn tick(pb: Option<&ProgressBar>, frames: u64) {
    if let Some(pb) = pb {
        if frames.is_multiple_of(100) {
            pb.set_position(frames);
        }
    }
}
