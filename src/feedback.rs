use crate::stats::{PlayerSummary, Role};

const FALLBACK_NOTE: &str = "Stable performance. Focus on movement timing and support angles.";

/// Deterministic coaching notes for one player, in a fixed order. Always
/// returns at least one note.
pub fn rule_notes(summary: &PlayerSummary) -> Vec<String> {
    let mut notes: Vec<&str> = Vec::new();

    match summary.position_role {
        Some(Role::Advanced) => {
            notes.push("You stay high relative to teammates. Check timing of runs to stay onside and available.")
        }
        Some(Role::Deep) => notes.push("You play deeper than most teammates. Look for earlier forward support runs."),
        Some(Role::Mid) | None => {}
    }

    if summary.avg_speed_kmh < 5.0 {
        notes.push("Low movement is recorded in this window. Add one clear movement action in similar moments.");
    } else if summary.avg_speed_kmh > 8.0 {
        notes.push("High movement is recorded in this window. Keep your movement quality consistent.");
    }

    if summary.max_speed_kmh < 18.0 {
        notes.push("Maximum speed is low in this window. Add a short acceleration action in similar moments.");
    } else if summary.max_speed_kmh > 24.0 {
        notes.push("Strong maximum speed is recorded. Use that speed to create separation in similar moments.");
    }

    if let Some(rank) = summary.position_rank_pct {
        if rank >= 80.0 {
            notes.push("You are among the most advanced players in this window. Stay available without drifting too high.");
        } else if rank <= 20.0 {
            notes.push("You are among the deepest players in this window. Offer a nearby support option.");
        }
    }

    if summary.ball_control_pct < 5.0 {
        notes.push("Ball control percentage is low. Look for small check-ins to get a touch.");
    } else if summary.ball_control_pct > 20.0 {
        notes.push("Ball control percentage is high. Keep your first touch clean to keep tempo.");
    }

    if summary.field_control_adv_pct > 50.0 {
        notes.push("You spend most of your time advanced. Stay connected to avoid getting isolated.");
    } else if summary.field_control_deep_pct > 50.0 {
        notes.push("You spend most of your time deep. Step in to support the next pass when safe.");
    }

    if summary.movement_control_pct < 20.0 {
        notes.push("Movement control is low. Add one clear movement action to create a new option.");
    } else if summary.movement_control_pct > 60.0 {
        notes.push("Movement control is high. Maintain your scanning so runs are timed.");
    }

    if summary.pressure_control_pct > 50.0 {
        notes.push("Pressure control is high. Use that stability to help the team reset.");
    }

    if notes.is_empty() {
        notes.push(FALLBACK_NOTE);
    }
    notes.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A player that trips no rule
    fn quiet_summary() -> PlayerSummary {
        PlayerSummary {
            track_id: 1,
            team: Some(1),
            frames_present: 100,
            possession_frames: 10,
            possession_pct_of_present: 10.0,
            possession_pct_of_total: 10.0,
            distance: 40.0,
            avg_speed_kmh: 6.5,
            max_speed_kmh: 20.0,
            top_speed_time_s: Some(1.0),
            possession_windows: Vec::new(),
            presence_windows: Vec::new(),
            presence_total_s: 12.0,
            position_rank_pct: Some(50.0),
            position_role: Some(Role::Mid),
            ball_control_pct: 10.0,
            field_control_deep_pct: 30.0,
            field_control_mid_pct: 40.0,
            field_control_adv_pct: 30.0,
            movement_control_pct: 40.0,
            pressure_control_pct: 30.0,
            feedback: Vec::new(),
        }
    }

    #[test]
    fn test_fallback_when_nothing_stands_out() {
        assert_eq!(rule_notes(&quiet_summary()), vec![FALLBACK_NOTE.to_string()]);
    }

    #[test]
    fn test_deep_player_notes() {
        let summary = PlayerSummary {
            position_rank_pct: Some(0.0),
            position_role: Some(Role::Deep),
            field_control_deep_pct: 70.0,
            pressure_control_pct: 70.0,
            ..quiet_summary()
        };
        let notes = rule_notes(&summary);
        assert_eq!(notes.len(), 4);
        assert!(notes[0].starts_with("You play deeper"));
        assert!(notes[1].starts_with("You are among the deepest"));
        assert!(notes[2].starts_with("You spend most of your time deep"));
        assert!(notes[3].starts_with("Pressure control is high"));
    }

    #[test]
    fn test_speed_thresholds_are_strict() {
        let summary = PlayerSummary {
            avg_speed_kmh: 5.0,
            max_speed_kmh: 24.0,
            ..quiet_summary()
        };
        assert_eq!(rule_notes(&summary), vec![FALLBACK_NOTE.to_string()]);

        let summary = PlayerSummary {
            avg_speed_kmh: 9.0,
            max_speed_kmh: 30.0,
            ..quiet_summary()
        };
        assert_eq!(rule_notes(&summary).len(), 2);
    }
}
