//! `hearth express`: switch the short-on-time task set.

use anyhow::Result;
use clap::{Args, ValueEnum};
use hearth_core::error::Notice;

use super::RunContext;
use crate::output::{with_notice, write_notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpressSwitch {
    On,
    Off,
    Toggle,
}

impl ExpressSwitch {
    const fn desired(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Toggle => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExpressArgs {
    /// on, off or toggle. Omit to show the current mode.
    #[arg(value_enum)]
    pub switch: Option<ExpressSwitch>,
}

pub fn run_express(args: &ExpressArgs, ctx: &RunContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let enabled = match args.switch {
        Some(switch) => session.set_express(switch.desired())?,
        None => session.prefs().express_enabled,
    };
    let notice = Notice::info(if enabled {
        "Express mode is on"
    } else {
        "Express mode is off"
    });

    if ctx.output.is_json() {
        let body = serde_json::json!({ "express_enabled": enabled });
        println!("{}", serde_json::to_string_pretty(&with_notice(&notice, &body)?)?);
    } else {
        // Status queries always print, even with --quiet.
        write_notice(&notice, ctx.quiet && args.switch.is_some())?;
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
        args: ExpressArgs,
    }

    #[test]
    fn switch_values_parse() {
        let w = Wrapper::parse_from(["test", "on"]);
        assert_eq!(w.args.switch, Some(ExpressSwitch::On));
        let w = Wrapper::parse_from(["test", "toggle"]);
        assert_eq!(w.args.switch.and_then(ExpressSwitch::desired), None);
        assert!(Wrapper::parse_from(["test"]).args.switch.is_none());
    }

    #[test]
    fn unknown_switch_is_rejected() {
        assert!(Wrapper::try_parse_from(["test", "maybe"]).is_err());
    }

    #[test]
    fn switch_maps_to_desired_state() {
        assert_eq!(ExpressSwitch::On.desired(), Some(true));
        assert_eq!(ExpressSwitch::Off.desired(), Some(false));
    }
}
