use recall_agent_model::ChatMessage;

use crate::message::Message;
use crate::tool::ToolDescriptor;

pub(crate) fn system_prompt(tools: &[ToolDescriptor]) -> String {
    let descriptions = tools
        .iter()
        .map(|tool| {
            format!("{}: {} - Use with {}", tool.name, tool.description, tool.usage)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You have access to the following tools:\n{descriptions}\n\n\
         To use a tool, include /tool:name{{arg1: value1, arg2: value2}} in your response."
    );
    if let Some(tool) = tools.first() {
        prompt.push_str(&format!("\nExample: To use {} write {}", tool.name, tool.usage));
    }
    prompt
}

/// Folds the recalled messages into one system message, keeping their
/// order.
pub(crate) fn context_message(relevant: &[Message]) -> Option<ChatMessage> {
    if relevant.is_empty() {
        return None;
    }
    let joined = relevant
        .iter()
        .map(Message::content)
        .collect::<Vec<_>>()
        .join(" ");
    Some(ChatMessage::system(format!("Relevant context: {joined}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_system_prompt_lists_tools() {
        let tools = vec![
            ToolDescriptor {
                name: "weather".to_owned(),
                description: "Get current weather conditions".to_owned(),
                usage: "/tool:weather{location: <location>}".to_owned(),
            },
            ToolDescriptor {
                name: "calculator".to_owned(),
                description: "Perform basic mathematical calculations".to_owned(),
                usage: "/tool:calculator{expression: <expression>}".to_owned(),
            },
        ];
        let prompt = system_prompt(&tools);
        let mut lines = prompt.lines();
        assert_eq!(lines.next(), Some("You have access to the following tools:"));
        assert_eq!(
            lines.next(),
            Some("weather: Get current weather conditions - Use with /tool:weather{location: <location>}")
        );
        assert!(lines.next().unwrap().starts_with("calculator: "));
        assert!(prompt.contains("/tool:name{arg1: value1, arg2: value2}"));
        assert!(prompt.ends_with("write /tool:weather{location: <location>}"));
    }

    #[test]
    fn test_context_message() {
        assert_eq!(context_message(&[]), None);
        let relevant = vec![
            Message::new(Role::User, "I live in London", 1),
            Message::new(Role::Assistant, "Noted.", 2),
        ];
        assert_eq!(
            context_message(&relevant),
            Some(ChatMessage::system("Relevant context: I live in London Noted."))
        );
    }
}
