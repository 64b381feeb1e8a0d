use aquawatch_core::error::AquaError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), AquaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// One compact JSON document per line, for streaming output.
pub fn print_line<T: Serialize + ?Sized>(value: &T) -> Result<(), AquaError> {
    let json = serde_json::to_string(value)?;
    println!("{json}");
    Ok(())
}
