//! Instruction sent alongside every tag photo.
//!
//! The upper/lower ordering is only a request to the model: swapped answers
//! are not detected, so deployments that need another layout override the
//! text through `recognition.prompt` in the config.

/// Shipping tags usually carry two stacked barcodes with a number printed
/// above each. Ask for the upper number first, then the lower one,
/// comma-separated, digits only.
pub const TAG_INSTRUCTION: &str = "この荷札の画像には、通常、上下に2つのバーコードがあります。それぞれのバーコードの上にある数字を両方とも抽出してください。上のバーコードの数字を先に、次に下のバーコードの数字を、カンマで区切って回答してください。例: \"12345, 67890\"。数字のみを返し、他のテキストは含めないでください。";

/// The configured instruction, or the built-in one when unset or blank.
pub fn instruction_or_default(configured: Option<&str>) -> String {
    match configured.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => TAG_INSTRUCTION.to_string(),
    }
}
