pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

pub use node::NodeConditionExt;
pub use node::NodeExt;

mod node;

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }
}

pub fn default<T: Default>() -> T {
    T::default()
}
