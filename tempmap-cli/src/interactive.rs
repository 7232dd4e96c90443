use inquire::{Confirm, CustomType, InquireError, Select, Text};
use log::debug;
use std::{fmt, path::PathBuf};
use tempmap_core::{ColorPolicy, Dashboard, HeightScale, Hour, SortOrder, TemperatureProvider};

use crate::cli::{print_view, write_html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Hour,
    Scale,
    CitySet,
    Sort,
    Labels,
    Colors,
    Refresh,
    Export,
    Quit,
}

impl Action {
    const ALL: [Action; 9] = [
        Action::Hour,
        Action::Scale,
        Action::CitySet,
        Action::Sort,
        Action::Labels,
        Action::Colors,
        Action::Refresh,
        Action::Export,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Hour => "Change hour",
            Action::Scale => "Change height scale",
            Action::CitySet => "Toggle regional / national cities",
            Action::Sort => "Change table order",
            Action::Labels => "Toggle map labels",
            Action::Colors => "Change color scheme",
            Action::Refresh => "Refresh data",
            Action::Export => "Export map to HTML",
            Action::Quit => "Quit",
        })
    }
}

/// Hour picker entry; `None` is "current conditions".
#[derive(Debug, Clone, Copy, PartialEq)]
struct HourChoice(Option<Hour>);

impl fmt::Display for HourChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("current conditions"),
            Some(h) => write!(f, "{h}"),
        }
    }
}

fn hour_choices() -> Vec<HourChoice> {
    std::iter::once(HourChoice(None))
        .chain((0..24).filter_map(|h| Hour::new(h).ok()).map(|h| HourChoice(Some(h))))
        .collect()
}

/// Esc and Ctrl-C end the prompt rather than the program.
fn cancelled(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

pub async fn run<P: TemperatureProvider>(dash: &mut Dashboard<P>) -> anyhow::Result<()> {
    print_view(&dash.view().await);

    loop {
        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(e) if cancelled(&e) => break,
            Err(e) => return Err(e.into()),
        };
        debug!("interactive action: {action:?}");

        let step = apply(dash, action).await;
        match step {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.downcast_ref::<InquireError>().is_some_and(cancelled) => continue,
            Err(e) => return Err(e),
        }

        print_view(&dash.view().await);
    }

    Ok(())
}

/// Returns `Ok(false)` when the session should end.
async fn apply<P: TemperatureProvider>(dash: &mut Dashboard<P>, action: Action) -> anyhow::Result<bool> {
    match action {
        Action::Hour => {
            let choices = hour_choices();
            let cursor = choices.iter().position(|c| c.0 == dash.mode().hour()).unwrap_or(0);
            let choice = Select::new("Hour of day:", choices).with_starting_cursor(cursor).prompt()?;
            dash.set_hour(choice.0);
        }
        Action::Scale => {
            let value = CustomType::<f64>::new("Height scale (m per °C, 1000-5000):")
                .with_default(dash.scale().get())
                .prompt()?;
            match HeightScale::new(value) {
                Ok(scale) => dash.set_scale(scale),
                Err(e) => eprintln!("! {e}"),
            }
        }
        Action::CitySet => {
            dash.toggle_city_set();
        }
        Action::Sort => {
            let orders = SortOrder::all().to_vec();
            let cursor = orders.iter().position(|o| *o == dash.sort()).unwrap_or(0);
            dash.set_sort(Select::new("Order by:", orders).with_starting_cursor(cursor).prompt()?);
        }
        Action::Labels => {
            dash.set_labels(!dash.labels());
        }
        Action::Colors => {
            let policies = vec![ColorPolicy::Gradient, ColorPolicy::Buckets];
            let cursor = policies.iter().position(|p| *p == dash.color_policy()).unwrap_or(0);
            dash.set_color_policy(Select::new("Color scheme:", policies).with_starting_cursor(cursor).prompt()?);
        }
        Action::Refresh => {
            dash.refresh();
        }
        Action::Export => {
            let path = PathBuf::from(Text::new("Write map to:").with_default("tempmap.html").prompt()?);
            if path.exists()
                && !Confirm::new(&format!("{} exists. Overwrite?", path.display()))
                    .with_default(false)
                    .prompt()?
            {
                return Ok(true);
            }
            let view = dash.view().await;
            write_html(&view, &path)?;
            println!("Map written to {}", path.display());
        }
        Action::Quit => return Ok(false),
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_choices_cover_the_day() {
        let choices = hour_choices();
        assert_eq!(choices.len(), 25);
        assert_eq!(choices[0].to_string(), "current conditions");
        assert_eq!(choices[1].to_string(), "00:00");
        assert_eq!(choices[24].to_string(), "23:00");
    }

    #[test]
    fn quit_is_last_action() {
        assert_eq!(Action::ALL.last(), Some(&Action::Quit));
    }

    #[test]
    fn cancel_detection() {
        assert!(cancelled(&InquireError::OperationCanceled));
        assert!(cancelled(&InquireError::OperationInterrupted));
        assert!(!cancelled(&InquireError::NotTTY));
    }
}
