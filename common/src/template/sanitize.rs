/// Max length of a CloudFormation stack name
const STACK_NAME_MAX: usize = 128;

/// Max length of a Lambda function name
const FUNCTION_NAME_MAX: usize = 64;

/// Build a CloudFormation logical ID out of user defined names
///
/// Logical IDs allow only alphanumeric characters, so every part is split on
/// separators and converted to PascalCase, e.g. ["orders-api", "http"] becomes
/// "OrdersApiHttp".
pub fn logical_id(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();

            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Stack names must start with a letter and contain only letters, digits and hyphens
pub fn stack_name(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    if !result.starts_with(|c: char| c.is_ascii_alphabetic()) {
        result.insert(0, 's');
    }

    result.truncate(STACK_NAME_MAX);
    result
}

/// Physical function name, unique within an account and region
pub fn function_name(stack: &str, name: &str) -> String {
    let mut result: String = format!("{stack}-{name}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    result.truncate(FUNCTION_NAME_MAX);
    result
}
