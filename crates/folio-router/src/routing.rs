use folio_core::{AgentDefinition, AgentRegistry};

/// 选择本轮使用的人设
pub trait RoutingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select<'a>(&self, registry: &'a AgentRegistry, utterance: &str) -> &'a AgentDefinition;
}

/// 总是选择根人设，由模型阅读指令自行决定如何回答
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRouting;

impl RoutingStrategy for ModelRouting {
    fn name(&self) -> &'static str {
        "model"
    }

    fn select<'a>(&self, registry: &'a AgentRegistry, _utterance: &str) -> &'a AgentDefinition {
        registry.root()
    }
}

/// 按人设关键词确定性路由
///
/// 命中关键词最多的专题人设胜出，数量相同时取定义顺序靠前的；
/// 没有任何命中时退回根人设。
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRouting;

impl RoutingStrategy for KeywordRouting {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn select<'a>(&self, registry: &'a AgentRegistry, utterance: &str) -> &'a AgentDefinition {
        let folded = utterance.trim().to_lowercase();
        let mut best: Option<(&AgentDefinition, usize)> = None;

        for agent in registry.topical() {
            let hits = agent
                .keywords
                .iter()
                .filter(|k| !k.trim().is_empty() && folded.contains(&k.trim().to_lowercase()))
                .count();
            if hits > best.map(|(_, h)| h).unwrap_or(0) {
                best = Some((agent, hits));
            }
        }

        best.map(|(agent, _)| agent).unwrap_or_else(|| registry.root())
    }
}
