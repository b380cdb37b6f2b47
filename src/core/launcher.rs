use anyhow::Result;

use crate::renderer::FaceStyle;
use crate::shared::config::AppConfig;
use crate::store::MatchStore;
use crate::ui::interactive::WatchOptions;

/// Pick a match from the menu, then open its clock.
pub fn run<S: MatchStore>(store: S, config: &AppConfig, face: FaceStyle) -> Result<()> {
    let Some(selection) = crate::ui::menu::run_menu(&store, config.shot_clock_secs)? else {
        println!("Menu cancelled.");
        return Ok(());
    };

    crate::utils::logger::info(&format!(
        "launch selection: match={} read_only={} shot_clock={}",
        selection.match_id,
        selection.read_only,
        selection
            .shot_clock
            .map(|secs| format!("{}s", secs))
            .unwrap_or_else(|| "<off>".to_string())
    ));

    let options = WatchOptions {
        view: config.view_options(selection.read_only),
        shot_clock: selection.shot_clock,
        face,
    };

    crate::ui::interactive::run_match_clock(store, selection.match_id, options)
}
