//! Command implementations for the CLI front end.
//!
//! Each command is thin glue: parse arguments, call into the gateway
//! or reconciler, print the result. All job-list state lives in the
//! store; nothing here keeps state of its own.

use std::path::PathBuf;

use anyhow::{bail, Context};
use sora_core::{JobStatus, VideoJob};
use sora_events::StudioEvent;
use sora_gateway::{ContentVariant, InputReference, SubmitRequest};

use crate::app::Studio;

/// Pull the value following `flag` out of `args`, removing both.
fn take_flag(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    if idx + 1 >= args.len() {
        args.remove(idx);
        return None;
    }
    let value = args.remove(idx + 1);
    args.remove(idx);
    Some(value)
}

/// Remove a bare switch from `args`, reporting whether it was present.
fn take_switch(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(idx) => {
            args.remove(idx);
            true
        }
        None => false,
    }
}

fn print_job_line(job: &VideoJob) {
    let prompt = job.prompt.as_deref().unwrap_or("(no prompt)");
    let preview: String = prompt.chars().take(60).collect();
    let progress = if job.status.is_active() {
        format!(" {}%", job.progress)
    } else {
        String::new()
    };
    println!("{}  {:<11}{}  {}", job.id, job.status.label(), progress, preview);
}

/// `create <prompt> [--model M] [--seconds N] [--size WxH] [--input FILE]`
pub async fn create(studio: &Studio, mut args: Vec<String>) -> anyhow::Result<()> {
    let model = take_flag(&mut args, "--model");
    let seconds = take_flag(&mut args, "--seconds")
        .map(|s| s.parse::<u32>().context("--seconds must be an integer"))
        .transpose()?;
    let size = take_flag(&mut args, "--size");
    let input = take_flag(&mut args, "--input");

    let prompt = args.join(" ");
    if prompt.trim().is_empty() {
        bail!("a prompt is required");
    }

    let input_reference = match input {
        Some(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            let file_name = PathBuf::from(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            Some(InputReference { file_name, bytes })
        }
        None => None,
    };

    let request = SubmitRequest {
        prompt: prompt.clone(),
        model,
        duration_secs: seconds.or(Some(studio.settings.default_duration_secs)),
        size: size.or_else(|| Some(studio.settings.default_size.clone())),
        input_reference,
    };

    let mut job = studio.api()?.submit(request).await?;
    println!("created {}", job.id);

    // The store keeps the prompt we actually sent, not the remote
    // echo, and falls back to a local creation time when the remote
    // omits one.
    job.prompt = Some(prompt);
    if job.created_at.is_none() {
        job.created_at = Some(chrono::Utc::now());
    }
    studio.store().insert_new(job);
    Ok(())
}

/// `list` -- print the locally tracked jobs, newest first.
pub fn list(studio: &Studio) {
    let jobs = studio.store().jobs();
    if jobs.is_empty() {
        println!("no jobs tracked; run `sora-studio create <prompt>`");
        return;
    }
    for job in &jobs {
        print_job_line(job);
    }
    let (completed, failed, active) = summary(studio);
    println!("{completed} completed, {failed} failed, {active} active");
}

/// `show <id>` -- print one job in full, refreshing it first while it
/// is still active.
pub async fn show(studio: &Studio, id: &str) -> anyhow::Result<()> {
    if let Some(job) = studio.store().get(id) {
        if job.status.is_active() {
            if let Ok(reconciler) = studio.reconciler() {
                reconciler.reconcile_one(id).await?;
            }
        }
    }

    let Some(job) = studio.store().get(id) else {
        bail!("job {id} is not tracked locally");
    };

    println!("id:         {}", job.id);
    println!("status:     {}", job.status.label());
    println!("progress:   {}%", job.progress);
    println!("prompt:     {}", job.prompt.as_deref().unwrap_or("(none)"));
    println!("model:      {}", job.model.as_deref().unwrap_or("(unknown)"));
    println!("seconds:    {}", job.seconds.as_deref().unwrap_or("?"));
    println!("size:       {}", job.size.as_deref().unwrap_or("?"));
    if let Some(t) = job.created_at {
        println!("created:    {t}");
    }
    if let Some(t) = job.completed_at {
        println!("completed:  {t}");
    }
    if let Some(t) = job.expires_at {
        println!("expires:    {t}");
    }
    if let Some(source) = &job.remixed_from_video_id {
        println!("remix of:   {source}");
    }
    if let Some(error) = &job.error {
        println!(
            "error:      {} ({})",
            error.message.as_deref().unwrap_or("unknown error"),
            error.code.as_deref().unwrap_or("no code")
        );
    }
    Ok(())
}

/// `refresh` -- pull the newest remote page and merge it in.
pub async fn refresh(studio: &Studio) -> anyhow::Result<()> {
    studio.reconciler()?.reconcile_all().await?;
    println!("refreshed {} job(s)", studio.store().len());
    Ok(())
}

/// `remix <id> <prompt>` -- derive a new job from an existing one.
pub async fn remix(studio: &Studio, id: &str, prompt: &str) -> anyhow::Result<()> {
    if prompt.trim().is_empty() {
        bail!("a replacement prompt is required");
    }

    let mut job = studio.api()?.remix(id, prompt).await?;
    println!("remixed {} -> {}", id, job.id);

    job.prompt = Some(prompt.to_string());
    if job.created_at.is_none() {
        job.created_at = Some(chrono::Utc::now());
    }
    studio.store().insert_new(job);
    Ok(())
}

/// `delete <id>` -- remove a job remotely (best-effort) and locally.
///
/// Local removal never depends on the remote side: without a
/// credential the remote record is left alone and the local one still
/// goes away.
pub async fn delete(studio: &Studio, id: &str) -> anyhow::Result<()> {
    match studio.reconciler() {
        Ok(reconciler) => match reconciler.delete_job(id).await {
            Ok(()) => println!("deleted {id}"),
            Err(e) => println!("removed {id} locally; remote deletion failed: {e}"),
        },
        Err(_) => {
            studio.store().remove_local(id);
            println!("removed {id} locally (no API key; remote record untouched)");
        }
    }
    Ok(())
}

/// `download <id> [--thumbnail] [--out FILE]` -- save generated
/// content to disk.
pub async fn download(studio: &Studio, id: &str, mut args: Vec<String>) -> anyhow::Result<()> {
    let thumbnail = take_switch(&mut args, "--thumbnail");
    let out = take_flag(&mut args, "--out");

    let api = studio.api()?;
    let (bytes, variant) = if thumbnail {
        // Fall back to the video when no thumbnail was generated.
        api.fetch_preview(id).await?
    } else {
        (api.fetch_content(id, ContentVariant::Video).await?, ContentVariant::Video)
    };

    let path = out.unwrap_or_else(|| match variant {
        ContentVariant::Video => format!("sora-{id}.mp4"),
        ContentVariant::Thumbnail => format!("sora-{id}-thumb.jpg"),
    });
    std::fs::write(&path, &bytes).with_context(|| format!("writing {path}"))?;
    println!("wrote {} byte(s) to {path}", bytes.len());
    Ok(())
}

/// `config [--duration N] [--size WxH] [--interval N] [--key KEY]` --
/// update and persist settings; with no flags, print the current ones.
pub fn config(studio: &mut Studio, mut args: Vec<String>) -> anyhow::Result<()> {
    let duration = take_flag(&mut args, "--duration")
        .map(|s| s.parse::<u32>().context("--duration must be an integer"))
        .transpose()?;
    let interval = take_flag(&mut args, "--interval")
        .map(|s| s.parse::<u64>().context("--interval must be an integer"))
        .transpose()?;
    let size = take_flag(&mut args, "--size");
    let key = take_flag(&mut args, "--key");

    let changed = duration.is_some() || interval.is_some() || size.is_some() || key.is_some();
    if let Some(d) = duration {
        studio.settings.default_duration_secs = d;
    }
    if let Some(i) = interval {
        studio.settings.poll_interval_secs = i;
    }
    if let Some(s) = size {
        studio.settings.default_size = s;
    }
    if let Some(k) = key {
        studio.settings.api_key = Some(k);
    }

    if changed {
        studio
            .settings
            .save(&studio.paths.settings_file())
            .context("writing settings file")?;
        println!("settings saved");
    }

    println!("duration: {}s", studio.settings.default_duration_secs);
    println!("size:     {}", studio.settings.default_size);
    println!("interval: {}s", studio.settings.poll_interval_secs);
    println!(
        "api key:  {}",
        if studio.settings.resolve_api_key().is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}

/// `export [FILE]` -- dump the tracked job list as JSON.
pub fn export(studio: &Studio, out: Option<&str>) -> anyhow::Result<()> {
    let jobs = studio.store().jobs();
    let serialized = serde_json::to_string_pretty(&jobs)?;
    match out {
        Some(path) => {
            std::fs::write(path, serialized).with_context(|| format!("writing {path}"))?;
            println!("exported {} job(s) to {path}", jobs.len());
        }
        None => println!("{serialized}"),
    }
    Ok(())
}

/// `watch` -- run the poll loop, printing transitions as they land.
///
/// Exits when every tracked job reaches a terminal status, or on
/// ctrl-c. The poller is shut down before returning either way.
pub async fn watch(studio: &Studio) -> anyhow::Result<()> {
    if studio.store().active_ids().is_empty() {
        println!("nothing to watch; all tracked jobs are settled");
        return Ok(());
    }

    let mut events = studio.store().events().subscribe();
    let poller = studio.start_poller()?;
    println!(
        "watching {} active job(s), polling every {}s (ctrl-c to stop)",
        studio.store().active_ids().len(),
        studio.settings.poll_interval_secs
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("stopping");
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(StudioEvent::JobCompleted { id }) => {
                        println!("completed: {id}");
                    }
                    Ok(StudioEvent::JobFailed { id, message }) => {
                        println!(
                            "failed: {id} ({})",
                            message.as_deref().unwrap_or("no error message")
                        );
                    }
                    Ok(StudioEvent::JobsChanged) => {
                        for job in studio.store().jobs() {
                            if job.status.is_active() {
                                print_job_line(&job);
                            }
                        }
                        if studio.store().active_ids().is_empty() {
                            println!("all jobs settled");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Event stream interrupted");
                    }
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

/// Count of jobs per terminal bucket, for the summary line.
pub fn summary(studio: &Studio) -> (usize, usize, usize) {
    let jobs = studio.store().jobs();
    let completed = jobs.iter().filter(|j| j.status == JobStatus::Completed).count();
    let failed = jobs.iter().filter(|j| j.status == JobStatus::Failed).count();
    let active = jobs.iter().filter(|j| j.status.is_active()).count();
    (completed, failed, active)
}
