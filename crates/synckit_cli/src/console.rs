//! Interactive terminal front-end (`gui` mode).
//!
//! Uses dialoguer prompts to collect roots and the ignore list, then offers a
//! start/stop menu while the scheduler thread polls in the background.

use dialoguer::{Input, Select};
use synckit_mirror::{
    EnumRootRole, RunConfig, SpecIgnorePatterns, SyncError, format_ignore_list, parse_ignore_list,
};

use crate::error::Result;
use crate::settings::SettingsStore;

/// Menu entries, indexed by [`Select`] position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumMenuAction {
    Toggle,
    ChangeSource,
    ChangeTarget,
    ChangeIgnore,
    Quit,
}

const L_MENU_ACTIONS: [EnumMenuAction; 5] = [
    EnumMenuAction::Toggle,
    EnumMenuAction::ChangeSource,
    EnumMenuAction::ChangeTarget,
    EnumMenuAction::ChangeIgnore,
    EnumMenuAction::Quit,
];

fn menu_label(action: EnumMenuAction, b_if_running: bool) -> &'static str {
    match action {
        EnumMenuAction::Toggle if b_if_running => "Stop",
        EnumMenuAction::Toggle => "Start",
        EnumMenuAction::ChangeSource => "Change source folder",
        EnumMenuAction::ChangeTarget => "Change target folder",
        EnumMenuAction::ChangeIgnore => "Change ignore list",
        EnumMenuAction::Quit => "Quit",
    }
}

/// Run the prompt loop until the operator quits. Syncing is stopped on exit.
pub fn run_console(store: &mut SettingsStore, run_config: &RunConfig) -> Result<()> {
    println!();
    prompt_root(store, run_config, EnumRootRole::Source)?;
    prompt_root(store, run_config, EnumRootRole::Target)?;
    prompt_ignore(store, run_config)?;

    loop {
        let b_if_running = run_config.is_running();
        let l_labels: Vec<&str> = L_MENU_ACTIONS
            .iter()
            .map(|a| menu_label(*a, b_if_running))
            .collect();
        let c_state = if b_if_running { "running" } else { "stopped" };

        let idx_action = Select::new()
            .with_prompt(format!("Sync is {c_state}"))
            .items(&l_labels)
            .default(0)
            .interact()?;

        match L_MENU_ACTIONS[idx_action] {
            EnumMenuAction::Toggle if b_if_running => run_config.stop(),
            EnumMenuAction::Toggle => start_or_reprompt(store, run_config)?,
            EnumMenuAction::ChangeSource => prompt_root(store, run_config, EnumRootRole::Source)?,
            EnumMenuAction::ChangeTarget => prompt_root(store, run_config, EnumRootRole::Target)?,
            EnumMenuAction::ChangeIgnore => prompt_ignore(store, run_config)?,
            EnumMenuAction::Quit => {
                run_config.stop();
                return Ok(());
            }
        }
    }
}

fn start_or_reprompt(store: &mut SettingsStore, run_config: &RunConfig) -> Result<()> {
    loop {
        match run_config.start() {
            Ok(()) => return Ok(()),
            Err(SyncError::RootMissing { role, .. }) | Err(SyncError::RootNotDirectory { role, .. }) => {
                let settings = run_config.settings();
                let path_root = match role {
                    EnumRootRole::Source => &settings.path_dir_src,
                    EnumRootRole::Target => &settings.path_dir_dst,
                };
                eprintln!("Folder '{}' not found!", path_root.display());
                prompt_root(store, run_config, role)?;
            }
            Err(e) => {
                eprintln!("{e}");
                return Ok(());
            }
        }
    }
}

fn prompt_root(store: &mut SettingsStore, run_config: &RunConfig, role: EnumRootRole) -> Result<()> {
    let c_current = match role {
        EnumRootRole::Source => store.values().source.clone(),
        EnumRootRole::Target => store.values().target.clone(),
    };
    let c_prompt = match role {
        EnumRootRole::Source => "Source folder",
        EnumRootRole::Target => "Target folder",
    };

    let mut input = Input::<String>::new().with_prompt(c_prompt);
    if let Some(c_current) = c_current {
        input = input.default(c_current);
    }
    let c_value = input.interact_text()?;
    let c_value = c_value.trim();

    match role {
        EnumRootRole::Source => {
            store.set_source(c_value)?;
            run_config.set_source_root(c_value);
        }
        EnumRootRole::Target => {
            store.set_target(c_value)?;
            run_config.set_target_root(c_value);
        }
    }
    Ok(())
}

fn prompt_ignore(store: &mut SettingsStore, run_config: &RunConfig) -> Result<()> {
    let c_current = store
        .values()
        .ignore
        .clone()
        .unwrap_or_else(|| format_ignore_list(&parse_ignore_list("")));

    let c_value: String = Input::new()
        .with_prompt("Ignore list (comma separated)")
        .default(c_current)
        .allow_empty(true)
        .interact_text()?;

    let l_patterns = parse_ignore_list(&c_value);
    store.set_ignore(&format_ignore_list(&l_patterns))?;
    run_config.set_ignore_patterns(SpecIgnorePatterns::new(l_patterns));
    Ok(())
}
