//! Datetime operators: `$recent`, `$upcoming`, `$dayOfWeek`, `$isWeekday`,
//! `$isWeekend`, `$timeOfDay`, `$age`.
//!
//! Field values are RFC 3339 strings, `%Y-%m-%d[ %H:%M:%S]` strings, or
//! millisecond timestamps. Calendar components (day of week, hour, age) use
//! process-local time; window operators compare instants. `now` comes from
//! the evaluation context, captured once per filter call, so every record in
//! one pass sees the same clock. A missing or unparseable field never
//! matches.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Timelike};
use serde_json::Value;

use super::{EvalContext, OperatorFamily, OperatorRegistry};
use crate::value::parse_datetime;

pub(crate) fn register(registry: &mut OperatorRegistry) {
    let fam = OperatorFamily::Datetime;
    registry.register("$recent", fam, Arc::new(eval_recent));
    registry.register("$upcoming", fam, Arc::new(eval_upcoming));
    registry.register("$dayOfWeek", fam, Arc::new(eval_day_of_week));
    registry.register(
        "$isWeekday",
        fam,
        Arc::new(|a, o, c| weekday_check(a, o, c, true)),
    );
    registry.register(
        "$isWeekend",
        fam,
        Arc::new(|a, o, c| weekday_check(a, o, c, false)),
    );
    registry.register("$timeOfDay", fam, Arc::new(eval_time_of_day));
    registry.register("$age", fam, Arc::new(eval_age));
}

fn local_value(actual: Option<&Value>) -> Option<DateTime<Local>> {
    parse_datetime(actual?).map(|dt| dt.with_timezone(&Local))
}

/// Duration spec `{days?, hours?, minutes?}`; at least one unit required
fn duration_spec(operand: &Value) -> Option<Duration> {
    let obj = operand.as_object()?;
    let days = obj.get("days").and_then(Value::as_i64);
    let hours = obj.get("hours").and_then(Value::as_i64);
    let minutes = obj.get("minutes").and_then(Value::as_i64);
    if days.is_none() && hours.is_none() && minutes.is_none() {
        return None;
    }
    Some(
        Duration::days(days.unwrap_or(0))
            + Duration::hours(hours.unwrap_or(0))
            + Duration::minutes(minutes.unwrap_or(0)),
    )
}

fn eval_recent(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(dt), Some(window)) = (local_value(actual), duration_spec(operand)) else {
        return false;
    };
    dt <= ctx.now && dt >= ctx.now - window
}

fn eval_upcoming(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(dt), Some(window)) = (local_value(actual), duration_spec(operand)) else {
        return false;
    };
    dt >= ctx.now && dt <= ctx.now + window
}

fn eval_day_of_week(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    let (Some(dt), Some(day)) = (local_value(actual), operand.as_u64()) else {
        return false;
    };
    // 0 = Sunday, 6 = Saturday
    u64::from(dt.weekday().num_days_from_sunday()) == day
}

fn weekday_check(
    actual: Option<&Value>,
    operand: &Value,
    _ctx: &EvalContext,
    weekday_operator: bool,
) -> bool {
    let (Some(dt), Some(want)) = (local_value(actual), operand.as_bool()) else {
        return false;
    };
    let is_weekday = dt.weekday().num_days_from_monday() < 5;
    let observed = if weekday_operator {
        is_weekday
    } else {
        !is_weekday
    };
    observed == want
}

fn eval_time_of_day(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    let Some(dt) = local_value(actual) else {
        return false;
    };
    let Some(obj) = operand.as_object() else {
        return false;
    };
    let (Some(start), Some(end)) = (
        obj.get("start").and_then(Value::as_u64),
        obj.get("end").and_then(Value::as_u64),
    ) else {
        return false;
    };

    let hour = u64::from(dt.hour());
    if start <= end {
        // Inclusive start, exclusive end
        hour >= start && hour < end
    } else {
        // Overnight window, e.g. start 22 / end 6
        hour >= start || hour < end
    }
}

fn eval_age(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(birth), Some(obj)) = (local_value(actual), operand.as_object()) else {
        return false;
    };
    let min = obj.get("min").and_then(Value::as_i64);
    let max = obj.get("max").and_then(Value::as_i64);
    if min.is_none() && max.is_none() {
        return false;
    }
    let unit = obj.get("unit").and_then(Value::as_str).unwrap_or("years");

    let Some(age) = whole_age(birth.date_naive(), ctx.now.date_naive(), unit) else {
        return false;
    };
    min.map(|m| age >= m).unwrap_or(true) && max.map(|m| age <= m).unwrap_or(true)
}

/// Whole elapsed years/months/days between birth and today. A birth date in
/// the future yields `None`.
fn whole_age(birth: NaiveDate, today: NaiveDate, unit: &str) -> Option<i64> {
    if birth > today {
        return None;
    }
    match unit {
        "years" => today.years_since(birth).map(i64::from),
        "months" => {
            let mut months = i64::from(today.year() - birth.year()) * 12
                + i64::from(today.month() as i32 - birth.month() as i32);
            if today.day() < birth.day() {
                months -= 1;
            }
            Some(months)
        }
        "days" => Some((today - birth).num_days()),
        _ => None,
    }
}
