//! Kind and scale classification.

use crate::variable::{Kind, OrdinalReference, Scale, Value, Variable};

/// Returns the kind tag attached at ingestion.
pub fn classify_kind(variable: &Variable) -> Kind {
    variable.kind()
}

/// Decides the measurement scale of a variable.
///
/// A variable is rank scale when its distinct non-missing values are all
/// labels of the reference, or all integer codes of it. An empty variable is
/// vacuously rank scale. Otherwise numeric variables are interval/ratio and
/// everything else is nominal.
pub fn classify_scale(variable: &Variable, reference: &OrdinalReference) -> Scale {
    let all_labels = variable.present().all(|value| match value {
        Value::Text(_) | Value::Flag(_) => reference.contains_label(&value.label()),
        Value::Number(_) => false,
    });
    let all_codes = variable.present().all(|value| match value {
        Value::Number(x) => reference.contains_code(*x),
        _ => false,
    });

    if all_labels || all_codes {
        return Scale::Rank;
    }
    match variable.kind() {
        Kind::Numeric => Scale::IntervalRatio,
        Kind::Categorical | Kind::Unknown => Scale::Nominal,
    }
}
