use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    HandposeEstimator,
    PalmDetector,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::PalmDetector, ModelKind::HandposeEstimator];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelKind::HandposeEstimator => "handpose_estimation_mediapipe_2023feb.onnx",
            ModelKind::PalmDetector => "palm_detection_mediapipe_2023feb.onnx",
        }
    }

    fn url(self) -> &'static str {
        match self {
            ModelKind::HandposeEstimator => {
                "https://raw.githubusercontent.com/214zzl995/gesture-universe/refs/heads/main/models/handpose_estimation_mediapipe_2023feb.onnx"
            }
            ModelKind::PalmDetector => {
                "https://raw.githubusercontent.com/214zzl995/gesture-universe/refs/heads/main/models/palm_detection_mediapipe_2023feb.onnx"
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            ModelKind::HandposeEstimator => "handpose estimator",
            ModelKind::PalmDetector => "palm detector",
        }
    }
}

pub fn model_path(models_dir: &Path, model: ModelKind) -> PathBuf {
    models_dir.join(model.file_name())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelDownloadEvent {
    AlreadyPresent { model: ModelKind },
    Started { model: ModelKind, total: Option<u64> },
    Progress { model: ModelKind, downloaded: u64 },
    Finished { model: ModelKind },
}

/// Download every missing model into `models_dir`, with a terminal progress
/// bar per download.
pub fn ensure_models_ready(models_dir: &Path) -> anyhow::Result<()> {
    for model in ModelKind::ALL {
        let mut progress: Option<ProgressBar> = None;
        ensure_model_ready(models_dir, model, |event| match event {
            ModelDownloadEvent::Started { total, .. } => {
                progress = Some(create_progress_bar(total));
            }
            ModelDownloadEvent::Progress { downloaded, .. } => {
                if let Some(pb) = progress.as_ref() {
                    pb.set_position(downloaded);
                }
            }
            ModelDownloadEvent::Finished { model } => {
                if let Some(pb) = progress.take() {
                    pb.finish_with_message(format!("{} model ready", model.label()));
                }
            }
            ModelDownloadEvent::AlreadyPresent { model } => {
                log::info!("{} model already present", model.label());
            }
        })?;
    }
    Ok(())
}

pub fn ensure_model_ready<F>(
    models_dir: &Path,
    model: ModelKind,
    mut on_event: F,
) -> anyhow::Result<PathBuf>
where
    F: FnMut(ModelDownloadEvent),
{
    let dest = model_path(models_dir, model);
    if dest.exists() {
        on_event(ModelDownloadEvent::AlreadyPresent { model });
        return Ok(dest);
    }

    fs::create_dir_all(models_dir).with_context(|| {
        format!("failed to create model directory {}", models_dir.display())
    })?;

    download_to_path(model, &dest, &mut on_event)
        .with_context(|| format!("failed to download {} model", model.label()))?;
    Ok(dest)
}

fn download_to_path<F>(model: ModelKind, dest: &Path, on_event: &mut F) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    let url = model.url();
    log::info!(
        "downloading {} model from {url} to {}",
        model.label(),
        dest.display()
    );

    let client = Client::new();
    let mut response = client
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    on_event(ModelDownloadEvent::Started {
        model,
        total: response.content_length(),
    });

    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_event(ModelDownloadEvent::Progress { model, downloaded });
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(ModelDownloadEvent::Finished { model });
    Ok(())
}

fn create_progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} downloading model") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
