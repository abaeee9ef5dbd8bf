//! Gatewright Headless Generation Harness
//!
//! Builds worlds from a config, runs every validation pass, and checks the
//! gating and reachability guarantees end to end.
//! Runs entirely in-process, with no rendering and no tile selection.
//!
//! Usage:
//!   cargo run -p gatewright-simtest
//!   cargo run -p gatewright-simtest -- --verbose
//!   cargo run -p gatewright-simtest -- --config my_world.json --json

use gatewright_core::engine::WorldEngine;
use gatewright_core::generation::{subdivide, SubdivisionOutcome};
use gatewright_core::world::{SectorSubdivisionState, World};
use gatewright_logic::bsp::{split_rooms, BspConfig};
use gatewright_logic::capability::{standard_profiles, Ability, AgentCapabilities, Polarity};
use gatewright_logic::config::{validate_config, ConfigError, WorldConfig};
use gatewright_logic::gate::{GateCondition, Softness};
use gatewright_logic::geometry::Vec3;
use gatewright_logic::navigation::{BiomeType, NavLink, NavNode, NavigationGraph};
use gatewright_logic::reachability::{run_validation_pass, QuickFixType, ValidationReport};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Default world (same JSON shipped in data/) ──────────────────────────
const WORLD_CONFIG_JSON: &str = include_str!("../../../data/world_config.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let emit_json = args.iter().any(|a| a == "--json");
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1));

    if !emit_json {
        println!("=== Gatewright Generation Harness ===\n");
    }

    let config_text = match config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Failed to read {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => WORLD_CONFIG_JSON.to_string(),
    };

    let mut results = Vec::new();

    // 1. Config parsing and validation
    let config = match load_config(&config_text, emit_json, &mut results) {
        Some(config) => config,
        None => {
            if emit_json {
                for r in &results {
                    eprintln!("{}: {}", r.name, r.detail);
                }
                std::process::exit(1);
            }
            report_and_exit(&results, verbose);
            return;
        }
    };

    if emit_json {
        match world_report_json(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // 2. Gate evaluation semantics
    results.extend(validate_gate_semantics(verbose));

    // 3. BSP room tiling sweep
    results.extend(validate_bsp_tiling(&config, verbose));

    // 4. Hierarchy determinism & idempotence
    results.extend(validate_hierarchy(&config, verbose));

    // 5. Two-node reachability scenario
    results.extend(validate_two_node_scenario(verbose));

    // 6. Full pipeline
    results.extend(validate_pipeline(&config, verbose));

    report_and_exit(&results, verbose);
}

fn report_and_exit(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Run the pipeline to completion and render the report as JSON.
///
/// The returned text is the whole of `--json` stdout.
fn world_report_json(config: &WorldConfig) -> Result<String, String> {
    let mut engine = WorldEngine::new(config.clone());
    engine.generate();
    let report = engine
        .run_to_completion(1.0 / 60.0)
        .ok_or("Pipeline finished without a validation report")?;
    serde_json::to_string_pretty(report).map_err(|e| format!("Failed to serialize report: {}", e))
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn load_config(text: &str, quiet: bool, results: &mut Vec<TestResult>) -> Option<WorldConfig> {
    if !quiet {
        println!("--- World Config ---");
    }

    let config = match WorldConfig::from_json_str(text) {
        Ok(config) => config,
        Err(ConfigError::Parse(e)) => {
            results.push(check("config_parse", false, format!("JSON parse error: {}", e)));
            return None;
        }
        Err(ConfigError::Invalid(issues)) => {
            for issue in issues {
                results.push(check("config_valid", false, issue.to_string()));
            }
            return None;
        }
    };
    results.push(check(
        "config_parse",
        true,
        format!(
            "seed {}, {} districts, {} sectors each",
            config.seed, config.district_count, config.sector_count
        ),
    ));

    let broken = WorldConfig {
        district_count: 0,
        ..config.clone()
    };
    let issues = validate_config(&broken);
    results.push(check(
        "config_rejects_empty_world",
        !issues.is_empty(),
        format!("{} issue(s) for a zero-district world", issues.len()),
    ));

    Some(config)
}

// ── 2. Gates ────────────────────────────────────────────────────────────

fn validate_gate_semantics(verbose: bool) -> Vec<TestResult> {
    println!("--- Gate Semantics ---");
    let mut results = Vec::new();

    // Every pair of base flags forms a dual containing both
    let mut pairs = 0;
    let mut duals_ok = true;
    for (i, &a) in Polarity::BASE.iter().enumerate() {
        for &b in &Polarity::BASE[i + 1..] {
            let dual = Polarity::pair(a, b);
            duals_ok &= dual.intersects(a) && dual.intersects(b);
            pairs += 1;
        }
    }
    results.push(check(
        "gate_polarity_duals",
        duals_ok && pairs == 28,
        format!("{} base pairs", pairs),
    ));

    let hard = GateCondition::new(Softness::Hard)
        .requiring_polarity(Polarity::SUN_MOON)
        .requiring_abilities(Ability::JUMP | Ability::DASH);
    let hard_ok = !hard.can_pass(Polarity::SUN, Ability::JUMP | Ability::DASH, 1.0)
        && !hard.can_pass(Polarity::SUN_MOON, Ability::JUMP, 1.0)
        && hard.can_pass(Polarity::SUN_MOON, Ability::JUMP | Ability::DASH, 0.0);
    results.push(check(
        "gate_hard_requires_superset",
        hard_ok,
        "Hard gate needs every required bit",
    ));

    let released = hard.clone().unlocked().can_pass(Polarity::NONE, Ability::NONE, 0.0)
        && hard.clone().inactive().can_pass(Polarity::NONE, Ability::NONE, 0.0);
    results.push(check(
        "gate_unlocked_or_inactive_passes",
        released,
        "unlocked and inactive gates are open",
    ));

    let missing = GateCondition::new(Softness::Hard)
        .requiring_polarity(Polarity::HEAT_COLD)
        .requiring_abilities(Ability::JUMP | Ability::DASH);
    let (mp, ma) = missing.missing_requirements(Polarity::HEAT, Ability::JUMP);
    let (np, na) =
        missing.missing_requirements(Polarity::HEAT_COLD, Ability::JUMP | Ability::DASH);
    results.push(check(
        "gate_missing_requirements",
        mp == Polarity::COLD && ma == Ability::DASH && np.is_empty() && na.is_empty(),
        format!("missing ({:?}, {:?})", mp, ma),
    ));

    let trivial = GateCondition::new(Softness::Trivial)
        .requiring_abilities(Ability::GRAPPLE)
        .with_skill_threshold(0.2);
    let trivial_ok = !trivial.can_pass(Polarity::NONE, Ability::NONE, 0.1)
        && trivial.can_pass(Polarity::NONE, Ability::NONE, 0.2)
        && trivial.can_pass(Polarity::NONE, Ability::NONE, 0.9);
    results.push(check(
        "gate_trivial_inclusive_bypass",
        trivial_ok,
        "skill 0.2 bypasses a 0.2 Trivial gate",
    ));

    let mut tier_lines = Vec::new();
    let mut tiers_monotonic = true;
    for softness in Softness::ALL {
        let gate = GateCondition::new(softness)
            .requiring_abilities(Ability::GRAPPLE)
            .with_skill_threshold(0.3);
        let mut passed_before = false;
        let mut first_pass = None;
        for step in 0..=100 {
            let skill = step as f32 / 100.0;
            let passes = gate.can_pass(Polarity::NONE, Ability::NONE, skill);
            tiers_monotonic &= passes || !passed_before;
            if passes && first_pass.is_none() {
                first_pass = Some(skill);
            }
            passed_before = passes;
        }
        tier_lines.push(format!("{:?}={:?}", softness, first_pass));
    }
    if verbose {
        println!("  bypass onset: {}", tier_lines.join(", "));
    }
    results.push(check(
        "gate_bypass_monotonic",
        tiers_monotonic,
        "passing never stops as skill rises",
    ));

    let any = GateCondition::new(Softness::Hard).requiring_polarity(Polarity::ANY);
    let any_ok = Polarity::BASE
        .iter()
        .all(|&p| any.can_pass(p, Ability::NONE, 0.0));
    results.push(check(
        "gate_any_polarity",
        any_ok,
        "ANY accepts every base polarity",
    ));

    results
}

// ── 3. BSP ──────────────────────────────────────────────────────────────

fn validate_bsp_tiling(config: &WorldConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- BSP Tiling ---");
    let mut results = Vec::new();
    let bsp = config.bsp;
    let bound = bsp.bound();

    let mut failures = 0;
    let mut min_rooms = usize::MAX;
    let mut max_rooms = 0;
    for seed in 0..500u64 {
        let rooms = split_rooms(&bsp, &mut StdRng::seed_from_u64(seed));
        let area: i32 = rooms.iter().map(|r| r.area()).sum();
        let disjoint = rooms
            .iter()
            .enumerate()
            .all(|(i, a)| rooms[i + 1..].iter().all(|b| !a.overlaps(b)));
        if rooms.is_empty() || rooms.len() > bsp.max_rooms || area != bound.area() || !disjoint {
            failures += 1;
        }
        min_rooms = min_rooms.min(rooms.len());
        max_rooms = max_rooms.max(rooms.len());
    }
    if verbose {
        println!("  room counts over 500 seeds: {}..={}", min_rooms, max_rooms);
    }
    results.push(check(
        "bsp_exact_tiling",
        failures == 0,
        format!(
            "{}x{} bound, {} failures over 500 seeds",
            bound.width, bound.height, failures
        ),
    ));

    let single = BspConfig {
        max_rooms: 1,
        ..bsp
    };
    let rooms = split_rooms(&single, &mut StdRng::seed_from_u64(7));
    results.push(check(
        "bsp_single_room_cap",
        rooms.len() == 1 && rooms[0] == bound,
        format!("{} room(s) with max_rooms=1", rooms.len()),
    ));

    results
}

// ── 4. Hierarchy ────────────────────────────────────────────────────────

fn validate_hierarchy(config: &WorldConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Hierarchy Generation ---");
    let mut results = Vec::new();

    let state = SectorSubdivisionState::new(config.sector_grid, config.sector_count, config.seed);
    let mut world = World::new();
    let mut districts = Vec::new();
    for x in 0..2 {
        if let Some(id) = world.add_district((x, 0), state) {
            world.mark_layout_done(id);
            districts.push(id);
        }
    }
    if districts.len() != 2 {
        results.push(check("hierarchy_setup", false, "could not place two districts"));
        return results;
    }

    let first = subdivide(&mut world, districts[0], &config.bsp);
    subdivide(&mut world, districts[1], &config.bsp);
    let node_count = world.len();
    let again = subdivide(&mut world, districts[0], &config.bsp);

    results.push(check(
        "hierarchy_idempotent",
        again == SubdivisionOutcome::AlreadySubdivided && world.len() == node_count,
        format!("first {:?}, then {:?}", first, again),
    ));

    let layout = |d: u32| -> Vec<_> {
        world
            .children(d)
            .iter()
            .map(|&s| {
                let rooms: Vec<_> = world
                    .children(s)
                    .iter()
                    .filter_map(|&r| world.room_record(r).copied())
                    .collect();
                (world.node(s).map(|n| n.coordinates), rooms)
            })
            .collect()
    };
    results.push(check(
        "hierarchy_deterministic",
        layout(districts[0]) == layout(districts[1]),
        "same inputs give the same relative placement",
    ));

    let ids_ok = world.nodes().iter().all(|n| {
        if n.is_district() {
            return n.parent_id == 0;
        }
        n.level
            .id_multiplier()
            .is_some_and(|m| n.id / m == n.parent_id && world.contains(n.parent_id))
    });
    results.push(check(
        "hierarchy_ids_embed_parent",
        ids_ok,
        format!("{} nodes checked", world.len()),
    ));

    results
}

// ── 5. Two-node scenario ────────────────────────────────────────────────

fn validate_two_node_scenario(_verbose: bool) -> Vec<TestResult> {
    println!("--- Two-Node Scenario ---");
    let mut results = Vec::new();

    let node = |id: u32| NavNode {
        node_id: id,
        world_position: Vec3::new(id as f32, 0.0, 0.0),
        biome_type: BiomeType::Neutral,
        primary_polarity: Polarity::NONE,
    };
    let mut graph = NavigationGraph::from_parts(
        vec![node(1), node(2)],
        vec![NavLink::bidirectional(1, 2)
            .with_gate(GateCondition::new(Softness::Hard).requiring_abilities(Ability::JUMP))],
    );

    let profiles = standard_profiles();
    let novice = AgentCapabilities::new("Novice");
    let master = profiles
        .iter()
        .find(|p| p.label == "Master")
        .cloned()
        .unwrap_or_else(|| AgentCapabilities::new("Master").with_abilities(Ability::EVERYTHING));

    match run_validation_pass(&mut graph, &[novice]) {
        Some(report) => results.push(check(
            "two_node_novice_blocked",
            report.unreachable_node_count == 1
                && report.issues.len() == 1
                && report.quick_fixes.len() == 1
                && report.quick_fixes[0].fix_type == QuickFixType::AddConnection,
            format!(
                "{} unreachable, {} issue(s), {} fix(es)",
                report.unreachable_node_count,
                report.issues.len(),
                report.quick_fixes.len()
            ),
        )),
        None => results.push(check("two_node_novice_blocked", false, "graph not ready")),
    }

    match run_validation_pass(&mut graph, &[master]) {
        Some(report) => results.push(check(
            "two_node_master_clear",
            report.unreachable_node_count == 0 && graph.unreachable_area_count() == 0,
            format!("{} unreachable", report.unreachable_node_count),
        )),
        None => results.push(check("two_node_master_clear", false, "graph not ready")),
    }

    results
}

// ── 6. Pipeline ─────────────────────────────────────────────────────────

fn validate_pipeline(config: &WorldConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Full Pipeline ---");
    let mut results = Vec::new();

    let mut engine = WorldEngine::new(config.clone());
    let districts = engine.generate();
    let mut ticks = 0;
    while !engine.is_idle() && ticks < 1000 {
        let summary = engine.tick(1.0 / 60.0);
        if verbose && summary.did_work() {
            println!(
                "  tick {}: subdivided {:?}, rebuilt={}, validated={}",
                ticks, summary.subdivided, summary.rebuilt, summary.validated
            );
        }
        ticks += 1;
    }
    let expected_ticks = districts
        .len()
        .div_ceil(config.pipeline.subdivisions_per_tick.max(1));
    results.push(check(
        "pipeline_settles",
        engine.is_idle() && ticks >= expected_ticks,
        format!("{} districts in {} ticks", districts.len(), ticks),
    ));

    let Some(report) = engine.last_report().cloned() else {
        results.push(check("pipeline_report", false, "no validation report"));
        return results;
    };
    results.push(check(
        "pipeline_report",
        report.total_nodes == engine.graph.node_count()
            && report.total_links == engine.graph.link_count(),
        format!(
            "{} nodes, {} links, start {:?}",
            report.total_nodes, report.total_links, report.start_node_id
        ),
    ));

    results.push(check(
        "pipeline_counter_written",
        engine.graph.unreachable_area_count() == report.unreachable_node_count,
        format!("{} unreachable (summed over profiles)", report.unreachable_node_count),
    ));

    let master_clear = report
        .profile("Master")
        .is_some_and(|p| p.unreachable.is_empty());
    results.push(check(
        "pipeline_master_reaches_all",
        master_clear,
        "Master profile reaches every node",
    ));

    let novice = report.profile("Novice").map(|p| &p.reachable);
    let monotonic = report.profiles.iter().all(|p| {
        novice.is_some_and(|n| n.is_subset(&p.reachable))
    });
    results.push(check(
        "pipeline_novice_subset",
        monotonic,
        "every profile reaches what Novice reaches",
    ));

    if verbose {
        for p in &report.profiles {
            println!(
                "  {:<13} reachable {:>4}  unreachable {:>4}",
                p.label,
                p.reachable.len(),
                p.unreachable.len()
            );
        }
    }

    // Unlocking every gate should open the whole world
    let gated: Vec<(u32, u32)> = engine
        .graph
        .links()
        .iter()
        .filter(|l| l.gate.is_blocking())
        .map(|l| (l.from_node_id, l.to_node_id))
        .collect();
    for &(a, b) in &gated {
        engine.unlock_gate(a, b);
    }
    engine.rebuild_navigation_graph();
    let cleared = engine
        .generate_validation_report()
        .map(|r| r.unreachable_node_count);
    results.push(check(
        "pipeline_unlock_all",
        cleared == Some(0),
        format!("{} gates unlocked, {:?} unreachable after", gated.len(), cleared),
    ));

    // --json output must load back as a report on its own
    let exported = world_report_json(config)
        .and_then(|json| serde_json::from_str::<ValidationReport>(&json).map_err(|e| e.to_string()));
    results.push(check(
        "pipeline_json_export",
        exported.as_ref().is_ok_and(|r| r.total_nodes == report.total_nodes),
        match &exported {
            Ok(r) => format!("{} nodes round-tripped", r.total_nodes),
            Err(e) => e.clone(),
        },
    ));

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_export_is_only_the_report() {
        let config = WorldConfig::from_json_str(WORLD_CONFIG_JSON).unwrap();
        let mut results = Vec::new();
        assert!(load_config(WORLD_CONFIG_JSON, true, &mut results).is_some());

        let json = world_report_json(&config).unwrap();
        assert!(json.starts_with('{'));
        let report: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.profiles.len(), 5);
    }
}
