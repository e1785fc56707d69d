//! Rule evaluation: which stored scripts apply to a navigation
//!
//! Everything here is pure. The matcher gathers the facts (stored rules,
//! navigation type, launcher markers), asks for a plan, and then executes
//! it against the host.

use crate::navigation::NavigationType;
use crate::pattern::matches;
use crate::storage::{GlobalScript, Script, Site, StorageData, WhenToRun};
use crate::timing::ScriptTiming;

/// Where a planned rule came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Site(String),
    Global(String),
}

/// One piece of code to inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun {
    pub timing: ScriptTiming,
    pub code: String,
}

/// A rule that matched, with everything needed to execute it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRule {
    pub source: RuleSource,
    pub name: String,
    /// Ask the user before running `scripts`
    pub confirm: bool,
    pub scripts: Vec<ScriptRun>,
}

/// Facts about a completed load that the rules depend on
#[derive(Debug, Clone, Copy)]
pub struct LoadFacts<'a> {
    pub url: &'a str,
    pub nav_type: NavigationType,
    /// The matched site was opened from the launcher grid for this load
    pub opened_via_launcher: bool,
    /// Any site was opened from the launcher during this session
    pub launcher_active: bool,
}

/// Ordered plan for a completed load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    /// Site owning the page, whose launcher marker is consumed
    pub site_id: Option<String>,
    pub rules: Vec<PlannedRule>,
}

pub fn site_script_should_run(script: &Script, opened_via_launcher: bool) -> bool {
    script.run_always || opened_via_launcher
}

/// Decide whether a matching global script fires on a completed load.
///
/// A refresh is judged by `on_refresh` alone. Otherwise `when_to_run`
/// decides, and `navigating_out` never fires here: it belongs to the
/// moment the tab leaves the host.
pub fn global_runs_on_load(global: &GlobalScript, nav_type: NavigationType, launcher_active: bool) -> bool {
    if nav_type == NavigationType::Refresh {
        return global.on_refresh;
    }

    match global.when_to_run {
        WhenToRun::OnSiteOpen => launcher_active,
        WhenToRun::NavigatingIn => true,
        WhenToRun::NavigatingOut => false,
    }
}

fn has_code(code: &str) -> bool {
    !code.trim().is_empty()
}

fn plan_global(global: &GlobalScript) -> Option<PlannedRule> {
    let scripts: Vec<ScriptRun> = global
        .scripts
        .iter()
        .filter(|snippet| has_code(&snippet.code))
        .map(|snippet| ScriptRun {
            timing: snippet.timing,
            code: snippet.code.clone(),
        })
        .collect();

    if scripts.is_empty() {
        return None;
    }

    Some(PlannedRule {
        source: RuleSource::Global(global.id.clone()),
        name: global.name.clone(),
        confirm: global.confirm_popup,
        scripts,
    })
}

/// Site scripts that should run, one rule per script so each keeps its
/// own confirmation
pub fn plan_site_scripts(site: &Site, opened_via_launcher: bool) -> Vec<PlannedRule> {
    site.scripts
        .iter()
        .filter(|script| has_code(&script.code))
        .filter(|script| site_script_should_run(script, opened_via_launcher))
        .map(|script| PlannedRule {
            source: RuleSource::Site(site.id.clone()),
            name: site.name.clone(),
            confirm: script.confirm_popup,
            scripts: vec![ScriptRun {
                timing: script.timing,
                code: script.code.clone(),
            }],
        })
        .collect()
}

/// Global scripts firing on a completed load of `url`
pub fn plan_global_on_load(
    globals: &[GlobalScript],
    url: &str,
    nav_type: NavigationType,
    launcher_active: bool,
) -> Vec<PlannedRule> {
    globals
        .iter()
        .filter(|global| matches(url, &global.domain_pattern))
        .filter(|global| {
            let runs = global_runs_on_load(global, nav_type, launcher_active);
            log::debug!("Global script {:?} on {:?} load: run={}", global.name, nav_type, runs);
            runs
        })
        .filter_map(plan_global)
        .collect()
}

/// `navigating_out` global scripts whose pattern matches the URL being left
pub fn plan_global_on_departure(globals: &[GlobalScript], departing_url: &str) -> Vec<PlannedRule> {
    globals
        .iter()
        .filter(|global| global.when_to_run == WhenToRun::NavigatingOut)
        .filter(|global| matches(departing_url, &global.domain_pattern))
        .filter_map(plan_global)
        .collect()
}

/// Full plan for a completed load: site scripts first, then global scripts
pub fn plan_load(storage: &StorageData, facts: LoadFacts<'_>) -> LoadPlan {
    let site = storage.site_for_url(facts.url);

    let mut rules = site
        .map(|site| plan_site_scripts(site, facts.opened_via_launcher))
        .unwrap_or_default();

    rules.extend(plan_global_on_load(
        &storage.global_scripts,
        facts.url,
        facts.nav_type,
        facts.launcher_active,
    ));

    LoadPlan {
        site_id: site.map(|site| site.id.clone()),
        rules,
    }
}
