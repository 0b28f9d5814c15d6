//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! With the `redb` backend every change is written through as it happens.
//! With the `file` backend the whole portal is loaded from a snapshot file
//! and written back after each mutating command.

use crate::api;
use crate::config::PortalConfig;
use hb_portal_core::{
    Audience, MemoryStore, NewMission, NewTask, Portal, PortalError, PortalSnapshot, Stage,
    SupportCategory, SupportRequestId, SupportStatus, TaskId, TraineeId, snapshot_from_bytes,
    snapshot_to_bytes,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (500 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Storage backends accepted by `--backend`.
const BACKENDS: [&str; 2] = ["file", "redb"];

/// Reject backend names other than "file" and "redb".
pub fn validate_backend(backend: &str) -> Result<(), PortalError> {
    if BACKENDS.contains(&backend) {
        Ok(())
    } else {
        Err(PortalError::InvalidInput(format!(
            "Unknown backend '{}' (expected one of: {})",
            backend,
            BACKENDS.join(", ")
        )))
    }
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PortalError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PortalError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PortalError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path: canonical, existing, and a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PortalError> {
    let canonical = path.canonicalize().map_err(|e| {
        PortalError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PortalError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, PortalError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PortalError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PortalError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PortalError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    config: &PortalConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    if !portal.is_persistent() {
        tracing::warn!(
            "File backend: changes made through the API stay in memory and are not written back"
        );
    }

    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);

    println!("HB Portal Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Environment: {}", config.environment);
    println!("  Host:        {}", host);
    println!("  Port:        {}", port);
    println!("  Backend:     {}", backend);
    println!("  Database:    {:?}", db_path);
    println!(
        "  Admin:       {}",
        if config.admin_key().is_some() {
            "enabled"
        } else {
            "disabled (no admin key)"
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, portal, config).await
}

// =============================================================================
// INIT AND STATUS
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool, seed: bool) -> Result<(), PortalError> {
    if db_path.exists() {
        if !force {
            return Err(PortalError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        if !db_path.is_file() {
            return Err(PortalError::IoError(format!(
                "Path '{}' is not a regular file",
                db_path.display()
            )));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| PortalError::IoError(format!("Remove old database: {}", e)))?;
    }

    let mut portal = match backend {
        "redb" => Portal::with_redb(db_path)?,
        _ => Portal::new(),
    };
    if seed {
        portal.seed_demo()?;
    }
    save_portal(&portal, db_path)?;

    println!(
        "Initialized new {} database at {:?}{}",
        backend,
        db_path,
        if seed { " with demo data" } else { "" }
    );
    Ok(())
}

/// Show record counts.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let metrics = portal.metrics()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "metrics": metrics,
        }));
        return Ok(());
    }

    println!("HB Portal Status");
    println!("================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Trainees:          {}", metrics.trainee_count);
    println!("Missions:          {}", metrics.mission_count);
    println!("Tasks:             {}", metrics.task_count);
    println!("Badges:            {}", metrics.badge_count);
    println!("Completed tasks:   {}", metrics.completed_tasks);
    println!("Pending approvals: {}", metrics.pending_approvals);
    println!("Open support:      {}", metrics.open_support_requests);

    Ok(())
}

// =============================================================================
// ROSTER
// =============================================================================

/// List trainees.
pub fn cmd_trainees(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let trainees = portal.trainees()?;

    if json_mode {
        print_json(&trainees);
        return Ok(());
    }

    if trainees.is_empty() {
        println!("No trainees registered.");
        return Ok(());
    }
    for t in &trainees {
        println!(
            "{:<12} {:<24} {:<18} {:>6} XP  {}",
            t.id,
            t.name,
            t.current_stage,
            t.overall_xp,
            t.cohort.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Register a trainee.
pub fn cmd_register(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    name: &str,
    cohort: Option<&str>,
    stage: Stage,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let trainee = portal.register_trainee(name, cohort, stage)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&trainee);
    } else {
        println!("Registered {} as {}", trainee.name, trainee.id);
    }
    Ok(())
}

// =============================================================================
// MISSIONS AND TASKS
// =============================================================================

/// Show the mission board for a trainee.
pub fn cmd_missions(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let board = portal.mission_board(&TraineeId::new(trainee))?;

    if json_mode {
        print_json(&board);
        return Ok(());
    }

    if board.is_empty() {
        println!("No missions open to {}.", trainee);
        return Ok(());
    }
    for card in &board {
        println!(
            "{} - {} ({}/{} tasks)",
            card.mission.id, card.mission.title, card.completed_tasks, card.total_tasks
        );
        for row in &card.tasks {
            println!(
                "    {:<10} {:<36} {:<14} {:>4} XP  {}",
                row.task.id,
                row.task.title,
                row.task.track.label(),
                row.task.xp_reward,
                row.status.label()
            );
        }
    }
    Ok(())
}

/// Mark a task done.
pub fn cmd_complete(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
    task: &str,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let outcome = portal.complete_task(&TraineeId::new(trainee), &TaskId::new(task))?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    if outcome.already_completed {
        println!("Task {} was already completed.", task);
    } else {
        println!(
            "Task {}: {} (+{} XP)",
            task,
            outcome.progress.status.label(),
            outcome.xp_awarded
        );
    }
    for badge in &outcome.new_badges {
        println!("New badge: {}", badge);
    }
    Ok(())
}

/// Approve a task.
pub fn cmd_approve(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
    task: &str,
    approver: &str,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let outcome =
        portal.approve_task(&TraineeId::new(trainee), &TaskId::new(task), approver)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    if outcome.already_completed {
        println!("Task {} was already completed; nothing to approve.", task);
    } else {
        println!(
            "Approved {} for {} by {} (+{} XP, mission {})",
            task,
            trainee,
            approver,
            outcome.xp_awarded,
            outcome.mission_progress.status.label()
        );
    }
    for badge in &outcome.new_badges {
        println!("New badge: {}", badge);
    }
    Ok(())
}

/// List tasks awaiting approval.
pub fn cmd_pending(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let pending = portal.pending_approvals(&TraineeId::new(trainee))?;

    if json_mode {
        print_json(&pending);
        return Ok(());
    }

    if pending.is_empty() {
        println!("Nothing awaiting approval for {}.", trainee);
        return Ok(());
    }
    for item in &pending {
        let mission = item
            .mission
            .as_ref()
            .map(|m| m.title.as_str())
            .unwrap_or("-");
        println!(
            "{:<10} {:<36} {:<28} submitted {}",
            item.task.id,
            item.task.title,
            mission,
            item.progress
                .completed_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

/// Create a mission.
pub fn cmd_mission_add(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    new: NewMission,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let mission = portal.create_mission(new)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&mission);
    } else {
        println!("Created mission {}: {}", mission.id, mission.title);
    }
    Ok(())
}

/// Add a task to a mission.
pub fn cmd_task_add(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    new: NewTask,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let task = portal.add_task(new)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&task);
    } else {
        println!(
            "Added task {} to {}: {} ({} XP, {})",
            task.id,
            task.mission_id,
            task.title,
            task.xp_reward,
            if task.requires_approval() {
                "needs approval"
            } else {
                "self-complete"
            }
        );
    }
    Ok(())
}

// =============================================================================
// TRAINEE VIEWS
// =============================================================================

/// Show levels, track progress and badges.
pub fn cmd_progress(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let report = portal.progress(&TraineeId::new(trainee))?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("{} ({})", report.name, report.trainee_id);
    println!(
        "Overall: level {} - {} XP ({}% to {})",
        report.overall.level, report.total_xp, report.overall.percent, report.overall.next_threshold
    );
    for track in &report.tracks {
        println!(
            "  {:<18} level {} - {} XP ({}%)",
            track.label, track.progress.level, track.progress.xp, track.progress.percent
        );
    }
    if report.badges.is_empty() {
        println!("Badges: none yet");
    } else {
        println!("Badges:");
        for earned in &report.badges {
            println!(
                "  {} ({})",
                earned.badge.name,
                earned.awarded_at.format("%Y-%m-%d")
            );
        }
    }
    Ok(())
}

/// Show the home summary.
pub fn cmd_home(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let home = portal.home(&TraineeId::new(trainee))?;

    if json_mode {
        print_json(&home);
        return Ok(());
    }

    println!("Welcome back, {}", home.name);
    let journey: Vec<String> = home
        .journey
        .iter()
        .map(|step| {
            if step.current {
                format!("[{}]", step.name)
            } else {
                step.name.clone()
            }
        })
        .collect();
    println!("Journey: {}", journey.join(" > "));
    println!(
        "Tasks completed this week: {}   Missions completed: {}",
        home.recent_tasks_completed, home.missions_completed
    );
    if !home.focus.is_empty() {
        println!("Focus next:");
        for f in &home.focus {
            println!(
                "  {} / {} ({}, {} XP)",
                f.mission_title,
                f.task_title,
                f.track.label(),
                f.xp_reward
            );
        }
    }
    if !home.announcements.is_empty() {
        println!("Announcements:");
        for a in &home.announcements {
            println!("  {}: {}", a.title, a.body);
        }
    }
    Ok(())
}

/// List the badge catalog.
pub fn cmd_badges(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let badges = portal.badges()?;

    if json_mode {
        print_json(&badges);
        return Ok(());
    }

    for badge in &badges {
        println!("{:<10} {:<28} {}", badge.id, badge.name, badge.description);
    }
    Ok(())
}

// =============================================================================
// SUPPORT
// =============================================================================

/// File a support request.
pub fn cmd_support_submit(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    trainee: &str,
    message: &str,
    category: SupportCategory,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let ticket = portal.submit_support_request(&TraineeId::new(trainee), message, category)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&ticket);
    } else {
        println!("Support request {} filed ({:?})", ticket.id, ticket.category);
    }
    Ok(())
}

/// List support requests, newest first.
pub fn cmd_support_list(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let requests = portal.support_requests()?;

    if json_mode {
        print_json(&requests);
        return Ok(());
    }

    if requests.is_empty() {
        println!("No support requests.");
        return Ok(());
    }
    for r in &requests {
        println!(
            "{:<18} {:<12} {:<16} {:<12} {}",
            r.id,
            r.trainee_id,
            format!("{:?}", r.category),
            format!("{:?}", r.status),
            r.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("    {}", r.message);
    }
    Ok(())
}

/// Change the status of a support request.
pub fn cmd_support_status(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: &str,
    status: SupportStatus,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let ticket = portal.update_support_status(&SupportRequestId::new(id), status)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&ticket);
    } else {
        println!("Support request {} is now {:?}", ticket.id, ticket.status);
    }
    Ok(())
}

// =============================================================================
// ANNOUNCEMENTS
// =============================================================================

/// Publish an announcement.
pub fn cmd_announce(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    title: &str,
    body: &str,
    audience: Audience,
) -> Result<(), PortalError> {
    let mut portal = load_or_create_portal(db_path, backend)?;
    let announcement = portal.publish_announcement(title, body, audience)?;
    save_portal(&portal, db_path)?;

    if json_mode {
        print_json(&announcement);
    } else {
        println!(
            "Published {} for {}",
            announcement.id, announcement.audience
        );
    }
    Ok(())
}

/// List announcements, newest first, optionally as seen by one audience.
pub fn cmd_announcements(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    audience: Option<Audience>,
) -> Result<(), PortalError> {
    let portal = load_or_create_portal(db_path, backend)?;
    let announcements = portal.announcements(audience)?;

    if json_mode {
        print_json(&announcements);
        return Ok(());
    }

    if announcements.is_empty() {
        println!("No announcements.");
        return Ok(());
    }
    for a in &announcements {
        println!(
            "{:<8} {:<10} {} {}",
            a.id,
            a.audience,
            a.published_at.format("%Y-%m-%d"),
            a.title
        );
        println!("    {}", a.body);
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Export every collection to a file.
pub fn cmd_export(
    db_path: &Path,
    backend: &str,
    output: &Path,
    format: &str,
) -> Result<(), PortalError> {
    let validated_output = validate_output_path(output)?;

    let portal = load_or_create_portal(db_path, backend)?;
    let snapshot = portal.snapshot()?;

    let data = match format {
        "snapshot" => snapshot_to_bytes(&snapshot)?,
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| PortalError::SerializationError(format!("JSON export: {}", e)))?,
        _ => {
            return Err(PortalError::InvalidInput(format!(
                "Unknown export format '{}' (expected snapshot or json)",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| PortalError::IoError(format!("Write file: {}", e)))?;

    println!(
        "Exported {} trainees, {} missions, {} tasks to {:?} ({} bytes)",
        snapshot.trainees.len(),
        snapshot.missions.len(),
        snapshot.tasks.len(),
        validated_output,
        data.len()
    );
    Ok(())
}

/// Merge a snapshot or JSON export into the current database.
///
/// Catalog records are upserted by id and records not in the file are
/// kept. Stored XP and completed tasks are never rolled back.
pub fn cmd_import(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    input: &Path,
) -> Result<(), PortalError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| PortalError::IoError(format!("Read file: {}", e)))?;
    let snapshot = decode_snapshot(&data)?;

    let mut portal = load_or_create_portal(db_path, backend)?;
    let report = portal.import_snapshot(snapshot)?;
    save_portal(&portal, db_path)?;

    tracing::info!(
        added = report.trainees_added,
        updated = report.trainees_updated,
        completed = report.tasks_completed,
        skipped = report.progress_skipped,
        "Snapshot imported"
    );
    if json_mode {
        print_json(&report);
    } else {
        println!(
            "Imported {} new and {} existing trainees, {} missions, {} tasks ({} newly completed)",
            report.trainees_added,
            report.trainees_updated,
            report.missions,
            report.tasks,
            report.tasks_completed
        );
    }
    Ok(())
}

/// Compact a redb database file in place.
pub fn cmd_compact(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PortalError> {
    if backend != "redb" {
        return Err(PortalError::InvalidInput(format!(
            "Compaction needs the redb backend, not '{}'",
            backend
        )));
    }
    let validated_path = validate_file_path(db_path)?;
    let size_of = |path: &Path| {
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| PortalError::IoError(format!("Cannot read file metadata: {}", e)))
    };

    let before = size_of(&validated_path)?;
    let reclaimed = {
        let mut portal = Portal::with_redb(&validated_path)?;
        portal.compact()?
    };
    let after = size_of(&validated_path)?;

    tracing::info!(before, after, reclaimed, "Database compacted");
    if json_mode {
        print_json(&serde_json::json!({
            "database": validated_path.to_string_lossy(),
            "reclaimed": reclaimed,
            "size_before": before,
            "size_after": after,
        }));
    } else {
        println!("Compacted {:?}: {} -> {} bytes", validated_path, before, after);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Decode snapshot bytes, falling back to a JSON export.
fn decode_snapshot(data: &[u8]) -> Result<PortalSnapshot, PortalError> {
    match snapshot_from_bytes(data) {
        Ok(snapshot) => Ok(snapshot),
        Err(binary_err) => serde_json::from_slice::<PortalSnapshot>(data).map_err(|_| {
            PortalError::DeserializationError(format!(
                "Not a portal snapshot or JSON export ({})",
                binary_err
            ))
        }),
    }
}

/// Load or create a portal from a database path with the given backend.
pub fn load_or_create_portal(db_path: &Path, backend: &str) -> Result<Portal, PortalError> {
    match backend {
        "redb" => Portal::with_redb(db_path),
        _ => {
            if db_path.exists() {
                validate_file_size(db_path, MAX_IMPORT_FILE_SIZE)?;
                let data = std::fs::read(db_path)
                    .map_err(|e| PortalError::IoError(format!("Read db: {}", e)))?;
                Ok(Portal::with_store(MemoryStore::from(decode_snapshot(&data)?)))
            } else {
                Ok(Portal::new())
            }
        }
    }
}

/// Save a portal to a database path.
///
/// A no-op for redb, which has already committed every change.
pub fn save_portal(portal: &Portal, db_path: &Path) -> Result<(), PortalError> {
    if portal.is_persistent() {
        Ok(())
    } else {
        let data = snapshot_to_bytes(&portal.snapshot()?)?;
        std::fs::write(db_path, &data)
            .map_err(|e| PortalError::IoError(format!("Write db: {}", e)))?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
