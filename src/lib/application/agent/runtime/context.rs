use super::{ServerGuidance, ToolContext, ToolDescriptor, ToolRuntime};
use crate::application::registry::CapabilityRegistry;

impl ToolRuntime {
    pub fn from_registry(server: &str, registry: &CapabilityRegistry) -> Self {
        let mut context = ToolContext::default();

        if let Some(instruction) = registry.instructions() {
            let instruction = instruction.trim();
            if !instruction.is_empty() {
                context.servers.push(ServerGuidance {
                    name: server.to_string(),
                    instruction: instruction.to_string(),
                });
            }
        }

        for operation in registry.operations() {
            let description = Some(operation.description.trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string);
            context.tools.push(ToolDescriptor {
                name: operation.name.clone(),
                description,
                input_schema: operation.input_schema.clone(),
            });
        }

        Self { context }
    }
}
