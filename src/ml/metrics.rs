use crate::error::{OrchidError, Result};

/// Share of positions where `predicted` equals `actual`.
pub fn accuracy<P, A>(predicted: &[P], actual: &[A]) -> Result<f64>
where
    P: PartialEq<A>,
{
    if predicted.len() != actual.len() {
        return Err(OrchidError::Validation(format!(
            "prediction count {} != label count {}",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(OrchidError::Validation(
            "accuracy of an empty set is undefined".to_string(),
        ));
    }

    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| *p == *a)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}
