//! Selection-aware widget population.
//!
//! [`WidgetPopulator::populate`] is pure: the same template, context and
//! `today` always produce the same widget. It reads the clock nowhere and
//! copies the template instead of writing to it.
//!
//! Selection is matched on canonical values only. Labels are regenerated on
//! every call (time slots carry the current timezone abbreviation), so they
//! can never be used to decide what is selected.

use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::{Map, Value};

use cadence_core::{SchedulingContext, Timezone};

use crate::errors::PopulateError;
use crate::template::{PopulatedWidget, Template, WidgetKind, WidgetOption};

/// Bookable time slots as `(canonical value, clock label)`.
pub const TIME_SLOTS: [(&str, &str); 3] = [
    ("11:30", "11:30 AM"),
    ("13:45", "1:45 PM"),
    ("15:00", "3:00 PM"),
];

const DATE_SLOT: &str = "date_selector";
const TIME_SLOT: &str = "time_slots";
const TIMEZONE_DISPLAY_SLOT: &str = "timezone";
const TIMEZONE_LIST_SLOT: &str = "timezone_list";
const SUBMIT_ACTION: &str = "submit_schedule";

/// Display label for a time slot in `tz`, e.g. `"1:45 PM PT"`.
pub fn time_slot_label(value: &str, tz: Timezone) -> Option<String> {
    TIME_SLOTS
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, clock)| format!("{clock} {}", tz.abbr()))
}

/// The first `count` Monday–Friday dates on or after `from`.
pub fn business_days(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    from.iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// Fills template slots from a [`SchedulingContext`].
#[derive(Clone, Copy, Debug)]
pub struct WidgetPopulator {
    date_count: usize,
}

impl Default for WidgetPopulator {
    fn default() -> Self {
        Self { date_count: 5 }
    }
}

impl WidgetPopulator {
    /// Populator offering `date_count` business days.
    pub fn new(date_count: usize) -> Self {
        Self { date_count }
    }

    /// Produce a populated copy of `template` for `ctx`, with date options
    /// starting at `today`.
    pub fn populate(
        &self,
        template: &Template,
        ctx: &SchedulingContext,
        today: NaiveDate,
    ) -> Result<PopulatedWidget, PopulateError> {
        let kind = template.widget_type;
        let mut properties = template.properties.clone();

        match kind {
            WidgetKind::ScheduleMeeting => {
                self.fill_schedule(&mut properties, ctx, today)?;
            }
            WidgetKind::TimezoneSelector => {
                let options = Timezone::ALL
                    .into_iter()
                    .map(|tz| WidgetOption {
                        label: tz.label().to_string(),
                        sublabel: None,
                        value: tz.abbr().to_string(),
                        offset: Some(tz.utc_offset().to_string()),
                        selected: tz == ctx.timezone,
                    })
                    .collect();
                set_options(&mut properties, kind, TIMEZONE_LIST_SLOT, options)?;
            }
        }

        Ok(PopulatedWidget {
            widget_type: kind,
            schema_version: template.schema_version.clone(),
            metadata: template.metadata.clone(),
            properties,
            styling: template.styling.clone(),
        })
    }

    fn fill_schedule(
        &self,
        properties: &mut Map<String, Value>,
        ctx: &SchedulingContext,
        today: NaiveDate,
    ) -> Result<(), PopulateError> {
        let kind = WidgetKind::ScheduleMeeting;

        if let Some(display) = properties
            .get_mut(TIMEZONE_DISPLAY_SLOT)
            .and_then(Value::as_object_mut)
        {
            let _ = display.insert("value".into(), Value::from(ctx.timezone_label()));
        }

        let selected_date = ctx.selected_date_value();
        let dates = business_days(today, self.date_count)
            .into_iter()
            .map(|d| {
                let value = d.format("%Y-%m-%d").to_string();
                WidgetOption {
                    label: d.format("%a").to_string().to_uppercase(),
                    sublabel: Some(d.format("%b %d").to_string()),
                    selected: selected_date == Some(value.as_str()),
                    value,
                    offset: None,
                }
            })
            .collect();
        set_options(properties, kind, DATE_SLOT, dates)?;

        let selected_time = ctx.selected_time_value();
        let times = TIME_SLOTS
            .iter()
            .map(|(value, clock)| WidgetOption {
                label: format!("{clock} {}", ctx.timezone_abbr()),
                sublabel: None,
                value: (*value).to_string(),
                offset: None,
                selected: selected_time == Some(*value),
            })
            .collect();
        set_options(properties, kind, TIME_SLOT, times)?;

        let submit = properties
            .get_mut("actions")
            .and_then(|a| a.get_mut("buttons"))
            .and_then(Value::as_array_mut)
            .and_then(|buttons| {
                buttons
                    .iter_mut()
                    .find(|b| b.get("action").and_then(Value::as_str) == Some(SUBMIT_ACTION))
            })
            .and_then(Value::as_object_mut)
            .ok_or(PopulateError::MissingSlot {
                kind,
                slot: "actions.submit_schedule",
            })?;
        let _ = submit.insert("enabled".into(), Value::Bool(ctx.has_complete_selection()));

        Ok(())
    }
}

fn set_options(
    properties: &mut Map<String, Value>,
    kind: WidgetKind,
    slot: &'static str,
    options: Vec<WidgetOption>,
) -> Result<(), PopulateError> {
    let target = properties
        .get_mut(slot)
        .and_then(Value::as_object_mut)
        .ok_or(PopulateError::MissingSlot { kind, slot })?;
    let options = options
        .into_iter()
        .filter_map(|o| serde_json::to_value(o).ok())
        .collect();
    let _ = target.insert("options".into(), Value::Array(options));
    Ok(())
}
