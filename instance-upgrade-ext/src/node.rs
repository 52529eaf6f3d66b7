use super::*;

const NODE_READY: &str = "Ready";
const CONDITION_TRUE: &str = "True";
const CONDITION_FALSE: &str = "False";

pub trait NodeExt {
    fn new(name: impl ToString) -> Self;
    fn with_conditions(self, conditions: impl IntoIterator<Item = corev1::NodeCondition>) -> Self;
    fn name(&self) -> &str;
    fn conditions(&self) -> &[corev1::NodeCondition];

    /// The `Ready` condition that decides readiness.
    ///
    /// When several `Ready` conditions are reported the last one in the
    /// order returned by the API wins, regardless of their timestamps.
    ///
    fn ready_condition(&self) -> Option<&corev1::NodeCondition> {
        self.conditions()
            .iter()
            .rfind(|condition| condition.type_ == NODE_READY)
    }

    /// A node without any `Ready` condition is not ready.
    ///
    fn is_ready(&self) -> bool {
        self.ready_condition()
            .is_some_and(|condition| condition.status == CONDITION_TRUE)
    }
}

impl NodeExt for corev1::Node {
    fn new(name: impl ToString) -> Self {
        let metadata = metav1::ObjectMeta::new(name);
        Self {
            metadata,
            ..default()
        }
    }

    fn with_conditions(self, conditions: impl IntoIterator<Item = corev1::NodeCondition>) -> Self {
        let status = corev1::NodeStatus {
            conditions: Some(conditions.into_iter().collect()),
            ..self.status.unwrap_or_default()
        };
        Self {
            status: Some(status),
            ..self
        }
    }

    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn conditions(&self) -> &[corev1::NodeCondition] {
        self.status
            .as_ref()
            .and_then(|status| status.conditions.as_deref())
            .unwrap_or_default()
    }
}

pub trait NodeConditionExt {
    fn new(type_: impl ToString, status: bool) -> Self;

    fn ready(status: bool) -> Self
    where
        Self: Sized,
    {
        Self::new(NODE_READY, status)
    }
}

impl NodeConditionExt for corev1::NodeCondition {
    fn new(type_: impl ToString, status: bool) -> Self {
        let status = if status { CONDITION_TRUE } else { CONDITION_FALSE };
        Self {
            type_: type_.to_string(),
            status: status.to_string(),
            ..default()
        }
    }
}
