/// Prints core linkage info; touches no database.
pub fn run() -> Result<(), String> {
    println!("focusline_core ping={}", focusline_core::ping());
    println!("focusline_core version={}", focusline_core::core_version());
    Ok(())
}
