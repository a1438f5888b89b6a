//! `hearth user`: show or change who is using this device.

use anyhow::Result;
use clap::Args;
use hearth_core::error::Notice;
use hearth_core::model::Person;
use serde::Serialize;
use std::io::{self, Write};

use super::RunContext;
use crate::output::{pretty_section, render_mode, with_notice, write_notice};

#[derive(Args, Debug)]
pub struct UserArgs {
    /// Person id to select. Omit to list people.
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserReport<'a> {
    current: Option<&'a str>,
    people: &'a [Person],
}

pub fn run_user(args: &UserArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;

    if let Some(id) = &args.id {
        session.set_user(id)?;
        let label = session
            .catalog()
            .person(id)
            .map_or(id.as_str(), |p| p.label.as_str());
        let notice = Notice::info(format!("Now using hearth as {label}"));
        if ctx.output.is_json() {
            let report = UserReport {
                current: session.prefs().current_user(),
                people: &session.catalog().people,
            };
            println!("{}", serde_json::to_string_pretty(&with_notice(&notice, &report)?)?);
        } else {
            write_notice(&notice, ctx.quiet)?;
        }
        return Ok(());
    }

    let report = UserReport {
        current: session.prefs().current_user(),
        people: &session.catalog().people,
    };
    render_mode(ctx.output, &report, write_text, write_pretty)
}

fn write_pretty(r: &UserReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "People")?;
    if r.people.is_empty() {
        writeln!(w, "No people in the catalog.")?;
    }
    for person in r.people {
        let marker = if r.current == Some(person.id.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(w, "{marker} {:<12} {}", person.id, person.label)?;
    }
    Ok(())
}

fn write_text(r: &UserReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    for person in r.people {
        let current = if r.current == Some(person.id.as_str()) {
            "current"
        } else {
            "-"
        };
        writeln!(w, "{}\t{}\t{current}", person.id, person.label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: UserArgs,
    }

    #[test]
    fn id_is_optional() {
        assert!(Wrapper::parse_from(["test"]).args.id.is_none());
        assert_eq!(
            Wrapper::parse_from(["test", "ana"]).args.id.as_deref(),
            Some("ana")
        );
    }

    #[test]
    fn text_marks_current_person() {
        let people = vec![
            Person {
                id: "papa".into(),
                label: "Papá".into(),
            },
            Person {
                id: "ana".into(),
                label: "Ana".into(),
            },
        ];
        let report = UserReport {
            current: Some("ana"),
            people: &people,
        };
        let mut buf = Vec::new();
        write_text(&report, &mut buf).expect("write");
        let out = String::from_utf8(buf).expect("utf8");
        assert_eq!(out, "papa\tPapá\t-\nana\tAna\tcurrent\n");
    }
}
