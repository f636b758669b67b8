//! Interactive shell for driving a PathSense device loop from a terminal.
//!
//! Supported slash-commands:
//!   /help                          – show this list
//!   /fix <lat> <lng> [heading]     – feed a position fix and tick
//!   /tick                          – tick without a new fix
//!   /obstacle <lat> <lng> <kind>   – record a classified obstacle
//!   /landmark <kind> <name>        – record a named landmark here
//!   /waypoint <name> [kind]        – save a waypoint at the current position
//!   /waypoints                     – list stored waypoints
//!   /goto <name>                   – start guidance towards a waypoint
//!   /route <name>                  – plan a route to a waypoint
//!   /next                          – next node of the planned route
//!   /area [radius]                 – describe the surroundings
//!   /near [radius]                 – any known obstacle within radius?
//!   /stats                         – map and session statistics
//!   /save                          – flush the map to storage now
//!   /clearmap                      – wipe the map (memory and storage)
//!   /quit | /exit                  – gracefully exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pathsense_map::obstacles;
use pathsense_runtime::ControlLoop;
use pathsense_sense::{Steer, ThreatLevel};
use pathsense_types::{EventPayload, Fix};

/// Entry point for the interactive shell.
///
/// `shutdown` is polled each iteration; when set the shell exits cleanly
/// after saving the map.
pub fn run(mut device: ControlLoop, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "pathsense>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        let mut parts = cmd.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match verb {
            "/help" => cmd_help(),
            "/fix" => cmd_fix(&mut device, &args),
            "/tick" => report_tick(device.tick(None)),
            "/obstacle" => cmd_obstacle(&mut device, &args),
            "/landmark" => cmd_landmark(&mut device, &args),
            "/waypoint" => cmd_waypoint(&mut device, &args),
            "/waypoints" => cmd_waypoints(&device),
            "/goto" => cmd_goto(&mut device, &args),
            "/route" => cmd_route(&mut device, &args),
            "/next" => cmd_next(&mut device),
            "/area" => cmd_area(&device, &args),
            "/near" => cmd_near(&device, &args),
            "/stats" => cmd_stats(&device),
            "/save" => match device.save_now() {
                Ok(()) => println!("  {} map saved", "✓".green()),
                Err(e) => println!("{}: {}", "Save failed".red(), e),
            },
            "/clearmap" => match device.clear_map() {
                Ok(()) => println!("  {} map cleared", "✓".green()),
                Err(e) => println!("{}: {}", "Clear failed".red(), e),
            },
            "/quit" | "/exit" => {
                if let Err(e) = device.save_now() {
                    println!("{}: {}", "Final save failed".red(), e);
                }
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "PathSense Commands".bold().underline());
    println!("  {} – feed a position fix and run one tick", "/fix <lat> <lng> [heading]".bold().cyan());
    println!("  {}                      – run one tick without a new fix", "/tick".bold().cyan());
    println!("  {} – record a classified obstacle", "/obstacle <lat> <lng> <kind>".bold().cyan());
    println!("  {}    – record a named landmark here", "/landmark <kind> <name>".bold().cyan());
    println!("  {}    – save a waypoint at the current position", "/waypoint <name> [kind]".bold().cyan());
    println!("  {}                 – list stored waypoints", "/waypoints".bold().cyan());
    println!("  {}               – start guidance towards a waypoint", "/goto <name>".bold().cyan());
    println!("  {}              – plan a route to a waypoint", "/route <name>".bold().cyan());
    println!("  {}                      – next node of the planned route", "/next".bold().cyan());
    println!("  {}             – describe the surroundings", "/area [radius]".bold().cyan());
    println!("  {}             – any known obstacle within radius?", "/near [radius]".bold().cyan());
    println!("  {}                     – map and session statistics", "/stats".bold().cyan());
    println!("  {}                      – flush the map to storage now", "/save".bold().cyan());
    println!("  {}                  – wipe the map entirely", "/clearmap".bold().cyan());
    println!("  {}               – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_fix(device: &mut ControlLoop, args: &[&str]) {
    let (Some(lat), Some(lng)) = (parse_f64(args.first()), parse_f64(args.get(1))) else {
        println!("  usage: /fix <lat> <lng> [heading]");
        return;
    };
    let mut fix = Fix::at(lat, lng);
    if let Some(heading) = parse_f64(args.get(2)) {
        fix = fix.with_heading(heading);
    }
    report_tick(device.tick(Some(fix)));
}

fn cmd_obstacle(device: &mut ControlLoop, args: &[&str]) {
    let (Some(lat), Some(lng), Some(kind)) =
        (parse_f64(args.first()), parse_f64(args.get(1)), args.get(2))
    else {
        println!("  usage: /obstacle <lat> <lng> <kind>");
        return;
    };
    match obstacles::report_obstacle(device.graph_mut(), lat, lng, *kind) {
        Some(_) => println!("  {} obstacle '{}' recorded", "✓".green(), kind),
        None => println!("{}", "  map is full, obstacle not recorded".yellow()),
    }
}

fn cmd_landmark(device: &mut ControlLoop, args: &[&str]) {
    let (Some(kind), Some(name)) = (args.first(), args.get(1)) else {
        println!("  usage: /landmark <kind> <name>");
        return;
    };
    match device.mark_landmark(name, *kind) {
        Ok(()) => println!("  {} landmark '{}' recorded", "✓".green(), name),
        Err(e) => println!("{}: {}", "Landmark failed".red(), e),
    }
}

fn cmd_waypoint(device: &mut ControlLoop, args: &[&str]) {
    let Some(name) = args.first() else {
        println!("  usage: /waypoint <name> [kind]");
        return;
    };
    let kind = args.get(1).copied().unwrap_or("misc");
    match device.set_waypoint_here(*name, kind) {
        Ok(()) => println!("  {} waypoint '{}' saved", "✓".green(), name),
        Err(e) => println!("{}: {}", "Waypoint failed".red(), e),
    }
}

fn cmd_waypoints(device: &ControlLoop) {
    if device.waypoints().is_empty() {
        println!("  no waypoints stored");
        return;
    }
    for wp in device.waypoints().iter() {
        println!(
            "  {} ({}) at {:.6}, {:.6}",
            wp.name.bold(),
            wp.kind.dimmed(),
            wp.lat,
            wp.lng
        );
    }
}

fn cmd_goto(device: &mut ControlLoop, args: &[&str]) {
    let Some(name) = args.first() else {
        println!("  usage: /goto <name>");
        return;
    };
    match device.navigate_to(name) {
        Ok(()) => println!("  {} navigating to '{}'", "✓".green(), name),
        Err(e) => println!("{}: {}", "Navigation failed".red(), e),
    }
}

fn cmd_route(device: &mut ControlLoop, args: &[&str]) {
    let Some(name) = args.first() else {
        println!("  usage: /route <name>");
        return;
    };
    match device.plan_route_to(name) {
        Ok(route) => {
            println!("  route with {} node(s):", route.len());
            for (lat, lng) in route {
                println!("    {:.6}, {:.6}", lat, lng);
            }
        }
        Err(e) => println!("{}: {}", "Route failed".red(), e),
    }
}

fn cmd_next(device: &mut ControlLoop) {
    let current = device.last_fix();
    match device.next_route_node() {
        Some((lat, lng)) => match current {
            Some(fix) => {
                let bearing = pathsense_geo::bearing_deg(fix.lat, fix.lng, lat, lng);
                let dist = pathsense_geo::distance_m(fix.lat, fix.lng, lat, lng);
                println!(
                    "  next: {:.6}, {:.6} ({} at {:.0} m)",
                    lat,
                    lng,
                    pathsense_geo::compass_point(bearing).bold(),
                    dist
                );
            }
            None => println!("  next: {:.6}, {:.6}", lat, lng),
        },
        None => println!("  route exhausted (plan one with /route)"),
    }
}

fn cmd_near(device: &ControlLoop, args: &[&str]) {
    let radius = parse_f64(args.first()).unwrap_or(10.0);
    let Some(fix) = device.last_fix() else {
        println!("{}", "  no fix yet (feed one with /fix)".yellow());
        return;
    };
    if device.graph().is_obstacle_nearby(fix.lat, fix.lng, radius) {
        println!("  {} obstacle within {radius} m", "!".red().bold());
    } else {
        println!("  {} no known obstacle within {radius} m", "✓".green());
    }
}

fn cmd_area(device: &ControlLoop, args: &[&str]) {
    let radius = parse_f64(args.first()).unwrap_or(20.0);
    match device.area_here(radius) {
        Ok(area) => println!("  area within {radius} m: {}", area.to_string().bold()),
        Err(e) => println!("{}: {}", "Area query failed".red(), e),
    }
}

fn cmd_stats(device: &ControlLoop) {
    let graph = device.graph();
    println!();
    println!("{}", "Map".bold().underline());
    println!(
        "  nodes     : {} / {}",
        graph.node_count(),
        graph.node_capacity()
    );
    println!(
        "  edges     : {} / {}",
        graph.edge_count(),
        graph.edge_capacity()
    );
    println!("  waypoints : {}", device.waypoints().len());
    match device.last_fix() {
        Some(fix) => println!("  position  : {:.6}, {:.6}", fix.lat, fix.lng),
        None => println!("  position  : {}", "no fix yet".dimmed()),
    }
    let guidance = device.guidance();
    if guidance.is_active() {
        if let Some(dest) = guidance.destination() {
            println!(
                "  guidance  : {} ({:.0} m, {}°)",
                dest.name.bold(),
                guidance.distance_m(),
                guidance.relative_direction()
            );
        }
    } else {
        println!("  guidance  : {}", "inactive".dimmed());
    }
    println!();
}

fn report_tick(report: pathsense_runtime::TickReport) {
    let threat = match report.threat {
        ThreatLevel::Clear => "clear".green(),
        ThreatLevel::Warning => "warning".yellow(),
        ThreatLevel::Danger => "DANGER".red().bold(),
    };
    println!(
        "  beams {:.0}/{:.0} cm – {}",
        report.lower_cm, report.upper_cm, threat
    );
    if let Some(steer) = report.steer {
        let hint = match steer {
            Steer::Left => "more room to the left",
            Steer::Right => "more room to the right",
            Steer::Hold => "no clear side, hold",
        };
        println!("  {} {}", "⇄".yellow().bold(), hint.yellow());
    }
    if let Some(classification) = report.obstacle {
        println!(
            "  {} mapped obstacle: {} ({:.0}%)",
            "!".red().bold(),
            classification.kind.bold(),
            classification.confidence * 100.0
        );
    }
    if let Some(instruction) = report.instruction {
        println!("  {} {}", "»".cyan().bold(), instruction.bold());
    }
    if report.saved {
        println!("  {}", "map autosaved".dimmed());
    }
    for event in &report.events {
        if let EventPayload::Degraded { component, details } = &event.payload {
            println!("  {} degraded: {} ({})", "~".yellow(), component, details.dimmed());
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_f64(arg: Option<&&str>) -> Option<f64> {
    arg.and_then(|s| s.parse::<f64>().ok())
}
