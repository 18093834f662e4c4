/// The fixed banner every generated file opens with, naming its purpose.
pub fn banner(purpose: &str) -> String {
    format!(
        "/*\n * WARNING: This file is auto-generated by dtoc, do not edit\n *\n * {purpose}\n */\n\n"
    )
}
