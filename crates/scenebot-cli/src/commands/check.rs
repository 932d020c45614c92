//! `scenebot check`: compile a scenario and report what each bot will do.

use std::path::Path;

use anyhow::Context;
use console::style;

use scenebot_core::prompt::extract_placeholders;
use scenebot_core::scenario::compile;
use scenebot_types::scenario::ScenarioModel;

pub fn check(path: &Path, json: bool) -> anyhow::Result<()> {
    let model = compile(path)
        .with_context(|| format!("failed to compile scenario {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        print_report(&model);
    }
    Ok(())
}

fn print_report(model: &ScenarioModel) {
    println!();
    println!(
        "  {} Scenario '{}' on {}",
        style("✓").green(),
        style(&model.name).cyan(),
        style(model.channel_target()).bold()
    );
    println!();

    for bot in &model.bots {
        println!("  {}", style(&bot.name).bold());
        if let Some(task) = &bot.profile.task {
            println!("    task: {task}");
        }
        if model.gates_channel() && !bot.speaks_in_channel {
            println!("    {}", style("private only").yellow());
        }
        let placeholders = extract_placeholders(&bot.prompt_template);
        println!(
            "    placeholders: {}",
            if placeholders.is_empty() {
                style("none".to_string()).dim().to_string()
            } else {
                placeholders.join(", ")
            }
        );
        for input in &bot.inputs {
            match &input.fixed_value {
                Some(value) => println!("    {} = {}", input.name, style(value).green()),
                None => println!("    {} {}", input.name, style("(runtime)").yellow()),
            }
        }
        println!();
    }
}
