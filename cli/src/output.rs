//! Presentation of responses as the classic text report or JSON.

use buildsys_core::Response;
use std::io::{self, Write};

pub fn render(response: &Response, json: bool, out: &mut impl Write) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, response)?;
        writeln!(out)
    } else {
        render_text(response, out)
    }
}

fn render_text(response: &Response, out: &mut impl Write) -> io::Result<()> {
    match response {
        Response::TaskNames { names } => render_list("tasks", names, out),
        Response::BuildNames { names } => render_list("builds", names, out),
        Response::Task { name, dependencies } => {
            writeln!(out, "Task info:")?;
            writeln!(out, " * name: {name}")?;
            writeln!(out, " * dependencies: {}", dependencies.join(", "))
        }
        Response::Build { name, tasks } => {
            writeln!(out, "Build info:")?;
            writeln!(out, " * name: {name}")?;
            writeln!(out, " * tasks: {}", tasks.join(", "))
        }
    }
}

fn render_list(kind: &str, names: &[String], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "List of available {kind}:")?;
    for name in names {
        writeln!(out, " * {name}")?;
    }
    Ok(())
}
