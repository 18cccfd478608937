//! Grouping of converted messages for display.

/// Number of symbols per group in session output.
pub const GROUP_SIZE: usize = 5;

/// Splits `msg` into blocks of `size` symbols separated by single spaces.
///
/// The last block may be shorter. A `size` of zero leaves the message as one
/// block.
#[must_use]
pub fn group_symbols(msg: &str, size: usize) -> String {
    if size == 0 {
        return msg.to_string();
    }

    let mut grouped = String::with_capacity(msg.len() + msg.len() / size);
    for (n, symbol) in msg.chars().enumerate() {
        if n > 0 && n % size == 0 {
            grouped.push(' ');
        }
        grouped.push(symbol);
    }
    grouped
}
