//! Scripted runs of the relocator against an [`IdeScene`].

use std::fmt::Write as _;

use relocate::{
    Outcome, RelocateConfig, Relocator,
    scene::{IdeScene, SceneOptions, pump},
};
use tracing::info;

use crate::{cli::Scenario, error::Result};

/// Result of one simulated step.
#[derive(Debug, Clone)]
pub struct Step {
    /// What was done.
    pub label: String,
    /// Relocation outcome afterwards.
    pub outcome: Outcome,
    /// Notifications delivered during the step.
    pub delivered: usize,
    /// Tree after the step.
    pub tree: String,
}

/// Scene shape for `scenario`.
fn options(scenario: Scenario) -> SceneOptions {
    let base = SceneOptions::default();
    match scenario {
        Scenario::Direct => base,
        Scenario::Deferred => SceneOptions {
            root_loaded: false,
            ..base
        },
        Scenario::LateControl => SceneOptions {
            toolbar: false,
            ..base
        },
        Scenario::NoTray => SceneOptions {
            tray: false,
            ..base
        },
        Scenario::NoFullscreen => SceneOptions {
            menu_bar: false,
            ..base
        },
    }
}

/// Records steps as they happen.
struct Recorder {
    /// Steps so far.
    steps: Vec<Step>,
}

impl Recorder {
    /// Snapshot the scene after `label`.
    fn step(&mut self, label: &str, relocator: &Relocator, scene: &IdeScene, delivered: usize) {
        let outcome = relocator.outcome();
        info!(step = label, ?outcome, delivered, "simulation step");
        self.steps.push(Step {
            label: label.to_string(),
            outcome,
            delivered,
            tree: scene.host.dump(),
        });
    }
}

/// Run `scenario`: start the relocator, let the host catch up, then enter and
/// leave full screen.
pub fn run(scenario: Scenario, config: RelocateConfig) -> Result<Vec<Step>> {
    let mut scene = IdeScene::build(options(scenario));
    let mut relocator = Relocator::new(config);
    let mut rec = Recorder { steps: Vec::new() };
    let root = scene.root;

    relocator.start(&mut scene.host, root);
    let n = pump(&mut relocator, &mut scene.host);
    rec.step("start", &relocator, &scene, n);

    match scenario {
        Scenario::Deferred => {
            scene.host.mark_loaded(root)?;
            let n = pump(&mut relocator, &mut scene.host);
            rec.step("main window loaded", &relocator, &scene, n);
        }
        Scenario::LateControl => {
            scene.enable_toolbar()?;
            let n = pump(&mut relocator, &mut scene.host);
            rec.step("toolbar enabled", &relocator, &scene, n);
        }
        Scenario::Direct | Scenario::NoTray | Scenario::NoFullscreen => {}
    }

    for (on, label) in [(true, "enter full screen"), (false, "leave full screen")] {
        scene.set_full_screen(on)?;
        let n = pump(&mut relocator, &mut scene.host);
        rec.step(label, &relocator, &scene, n);
    }

    relocator.shutdown(&mut scene.host);
    Ok(rec.steps)
}

/// Render `steps` for the terminal.
pub fn render(steps: &[Step], with_tree: bool) -> String {
    let mut out = String::new();
    for s in steps {
        let _ignored = writeln!(
            out,
            "== {}: {:?} ({} notifications)",
            s.label, s.outcome, s.delivered
        );
        if with_tree {
            out.push_str(&s.tree);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(scenario: Scenario) -> Vec<Outcome> {
        run(scenario, RelocateConfig::default())
            .unwrap()
            .into_iter()
            .map(|s| s.outcome)
            .collect()
    }

    #[test]
    fn direct_is_placed_throughout() {
        assert_eq!(outcomes(Scenario::Direct), vec![Outcome::Placed; 3]);
    }

    #[test]
    fn deferred_places_after_load() {
        assert_eq!(
            outcomes(Scenario::Deferred),
            vec![
                Outcome::Pending,
                Outcome::Placed,
                Outcome::Placed,
                Outcome::Placed
            ]
        );
    }

    #[test]
    fn late_control_places_once_enabled() {
        assert_eq!(
            outcomes(Scenario::LateControl)[..2],
            [Outcome::Pending, Outcome::Placed]
        );
    }

    #[test]
    fn no_tray_is_impossible() {
        assert_eq!(outcomes(Scenario::NoTray), vec![Outcome::Impossible; 3]);
    }

    #[test]
    fn full_screen_step_shows_wrapper_under_dock_panel() {
        let steps = run(Scenario::Direct, RelocateConfig::default()).unwrap();
        let full = &steps[1].tree;
        let dock = full.lines().position(|l| l.contains("DockPanel")).unwrap();
        assert!(full.lines().nth(dock + 2).unwrap().contains("StackPanel"));
    }

    #[test]
    fn render_lists_every_step() {
        let steps = run(Scenario::NoFullscreen, RelocateConfig::default()).unwrap();
        let text = render(&steps, false);
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("== start: Placed"));
    }

    #[test]
    fn bundled_config_moves_standard_toolbar() {
        let cfg =
            RelocateConfig::from_ron(include_str!("../configs/standard-toolbar.ron")).unwrap();
        assert_eq!(cfg.anchors.moved_control_label, "Standard");
        assert_eq!(cfg.info_padding, 16.0);
        let steps = run(Scenario::Direct, cfg).unwrap();
        assert_eq!(steps[0].outcome, Outcome::Placed);
    }
}
