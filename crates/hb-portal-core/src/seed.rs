//! Demo roster and catalog for local runs and tests.

use crate::progression::ProgressionEngine;
use crate::store::PortalStore;
use crate::{
    Announcement, AnnouncementId, Audience, Mission, MissionId, MissionTask, PortalError, Stage, TaskId, Trainee,
    TraineeId, Track,
};
use chrono::{DateTime, TimeDelta, Utc};

/// Install two trainees, two missions, five tasks, three announcements and
/// the badge catalog.
///
/// Records are upserted by id, so seeding twice leaves the same data.
/// Missions become active on the date of `now`.
pub fn seed_demo<S: PortalStore + ?Sized>(
    store: &mut S,
    now: DateTime<Utc>,
) -> Result<(), PortalError> {
    let today = now.date_naive();

    let trainees = [
        ("trainee-1", "Aisha Tan", Stage::SkillsTraining, [220, 140, 60, 20]),
        ("trainee-2", "Marcus Lim", Stage::Orientation, [80, 40, 20, 20]),
    ];
    for (id, name, stage, [overall, kitchen, stall_ops, life_mindset]) in trainees {
        let mut trainee = Trainee::new(
            TraineeId::new(id),
            name,
            Some("Cohort Orion".to_string()),
            stage,
            now,
        );
        trainee.overall_xp = overall;
        trainee.kitchen_xp = kitchen;
        trainee.stall_ops_xp = stall_ops;
        trainee.life_mindset_xp = life_mindset;
        store.save_trainee(trainee)?;
    }

    let missions = [
        (
            "mission-1",
            "Knife Skills Foundations",
            "Practice safe handling and precision cuts for daily prep.",
            Stage::SkillsTraining,
            120,
        ),
        (
            "mission-2",
            "Orientation Day",
            "Meet the team, tour the kitchen, and understand safety basics.",
            Stage::Orientation,
            80,
        ),
    ];
    for (id, title, description, stage, total_xp_reward) in missions {
        store.save_mission(Mission {
            id: MissionId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            stage: Some(stage),
            active_from: Some(today),
            active_to: None,
            total_xp_reward,
        })?;
    }

    let tasks = [
        ("task-1", "mission-1", "Julienne practice", "Consistent julienne cut on carrots and cucumbers.", Track::Kitchen, true),
        ("task-2", "mission-1", "Knife safety review", "Review safety checklist with mentor.", Track::LifeMindset, false),
        ("task-3", "mission-1", "Prep station setup", "Lay out tools and ingredients efficiently.", Track::StallOps, true),
        ("task-4", "mission-2", "Kitchen tour", "Walkthrough of the training kitchen with mentor.", Track::StallOps, true),
        ("task-5", "mission-2", "Safety briefing", "Learn emergency procedures and hygiene standards.", Track::LifeMindset, false),
    ];
    for (id, mission_id, title, description, track, auto_complete) in tasks {
        store.save_task(MissionTask {
            id: TaskId::new(id),
            mission_id: MissionId::new(mission_id),
            title: title.to_string(),
            description: description.to_string(),
            track,
            xp_reward: 40,
            auto_complete,
        })?;
    }

    let announcements = [
        ("ann-1", "New module launch", "WSQ Food Safety 2 is open.", Audience::Trainees, 3),
        ("ann-2", "Mentor sync", "Mentor standup on Friday.", Audience::Mentors, 2),
        (
            "ann-3",
            "Public feedback",
            "Share praise or concerns directly with the ops team.",
            Audience::All,
            1,
        ),
    ];
    for (id, title, body, audience, days_ago) in announcements {
        store.save_announcement(Announcement {
            id: AnnouncementId::new(id),
            title: title.to_string(),
            body: body.to_string(),
            audience,
            published_at: now - TimeDelta::days(days_ago),
        })?;
    }

    ProgressionEngine::install_rule_badges(store)?;

    Ok(())
}
