use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use snafu::{OptionExt, Snafu};

use crate::kvp::{Annotation, Annotations, Label, Labels};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("object has no namespace set"))]
    NoNamespace,

    #[snafu(display("object has no name set"))]
    NoName,

    #[snafu(display("object has no uid set"))]
    NoUid,
}

/// A builder to build [`ObjectMeta`] objects.
#[derive(Clone, Default)]
pub struct ObjectMetaBuilder {
    name: Option<String>,
    generate_name: Option<String>,
    namespace: Option<String>,
    owner_references: Option<Vec<OwnerReference>>,
    labels: Option<Labels>,
    annotations: Option<Annotations>,
}

impl ObjectMetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn name_opt(&mut self, name: impl Into<Option<String>>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn generate_name(&mut self, generate_name: impl Into<String>) -> &mut Self {
        self.generate_name = Some(generate_name.into());
        self
    }

    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace_opt(&mut self, namespace: impl Into<Option<String>>) -> &mut Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets a single owner reference built from the given resource. `block_owner_deletion` and
    /// `controller` are passed along verbatim, see [`OwnerReferenceBuilder`] for their meaning.
    pub fn ownerreference_from_resource<T: Resource<DynamicType = ()>>(
        &mut self,
        resource: &T,
        block_owner_deletion: Option<bool>,
        controller: Option<bool>,
    ) -> Result<&mut Self> {
        let owner_reference = OwnerReferenceBuilder::new()
            .initialize_from_resource(resource)
            .block_owner_deletion_opt(block_owner_deletion)
            .controller_opt(controller)
            .build()?;

        self.owner_references
            .get_or_insert_with(Vec::new)
            .push(owner_reference);
        Ok(self)
    }

    pub fn with_label(&mut self, label: impl Into<Label>) -> &mut Self {
        self.labels.get_or_insert_with(Labels::new).insert(label);
        self
    }

    pub fn with_labels(&mut self, labels: impl IntoIterator<Item = Label>) -> &mut Self {
        self.labels.get_or_insert_with(Labels::new).extend(labels);
        self
    }

    pub fn with_annotation(&mut self, annotation: impl Into<Annotation>) -> &mut Self {
        self.annotations
            .get_or_insert_with(Annotations::new)
            .insert(annotation);
        self
    }

    pub fn with_annotations(&mut self, annotations: impl IntoIterator<Item = Annotation>) -> &mut Self {
        self.annotations
            .get_or_insert_with(Annotations::new)
            .extend(annotations);
        self
    }

    pub fn build(&self) -> ObjectMeta {
        ObjectMeta {
            name: self.name.clone(),
            generate_name: self.generate_name.clone(),
            namespace: self.namespace.clone(),
            owner_references: self.owner_references.clone(),
            labels: self.labels.clone().map(|labels| labels.into()),
            annotations: self.annotations.clone().map(|annotations| annotations.into()),
            ..ObjectMeta::default()
        }
    }
}

/// A builder to build [`OwnerReference`] objects, typically used to tie a dependent object (such
/// as a `NodeClaim`) back to the object that caused it to be created.
#[derive(Clone, Default)]
pub struct OwnerReferenceBuilder {
    api_version: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    uid: Option<String>,
    block_owner_deletion: Option<bool>,
    controller: Option<bool>,
}

impl OwnerReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_from_resource<T: Resource<DynamicType = ()>>(mut self, resource: &T) -> Self {
        self.api_version = Some(T::api_version(&()).to_string());
        self.kind = Some(T::kind(&()).to_string());
        self.name = Some(resource.name_any());
        self.uid = resource.uid();
        self
    }

    pub fn block_owner_deletion(mut self, block_owner_deletion: bool) -> Self {
        self.block_owner_deletion = Some(block_owner_deletion);
        self
    }

    pub fn block_owner_deletion_opt(mut self, block_owner_deletion: Option<bool>) -> Self {
        self.block_owner_deletion = block_owner_deletion;
        self
    }

    pub fn controller(mut self, controller: bool) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn controller_opt(mut self, controller: Option<bool>) -> Self {
        self.controller = controller;
        self
    }

    pub fn build(self) -> Result<OwnerReference> {
        Ok(OwnerReference {
            api_version: self.api_version.context(NoNameSnafu)?,
            kind: self.kind.context(NoNameSnafu)?,
            name: self.name.context(NoNameSnafu)?,
            uid: self.uid.context(NoUidSnafu)?,
            block_owner_deletion: self.block_owner_deletion,
            controller: self.controller,
        })
    }
}

#[cfg(test)]
mod tests {
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[kube(group = "test", version = "v1", kind = "Widget", namespaced)]
    struct WidgetSpec {}

    #[test]
    fn builds_basic_metadata() {
        let meta = ObjectMetaBuilder::new()
            .name("foo")
            .namespace("default")
            .build();

        assert_eq!(meta.name.as_deref(), Some("foo"));
        assert_eq!(meta.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn owner_reference_requires_uid() {
        let widget: Widget = serde_yaml::from_str(
            "
apiVersion: test/v1
kind: Widget
metadata:
  name: foo
  namespace: default
spec: {}
",
        )
        .unwrap();

        let result = ObjectMetaBuilder::new()
            .ownerreference_from_resource(&widget, None, Some(true))
            .map(|_| ());

        assert_eq!(result, Err(Error::NoUid));
    }

    #[test]
    fn owner_reference_from_resource() {
        let widget: Widget = serde_yaml::from_str(
            "
apiVersion: test/v1
kind: Widget
metadata:
  name: foo
  namespace: default
  uid: 123
spec: {}
",
        )
        .unwrap();

        let meta = ObjectMetaBuilder::new()
            .ownerreference_from_resource(&widget, None, Some(true))
            .unwrap()
            .build();

        let owner = &meta.owner_references.unwrap()[0];
        assert_eq!(owner.name, "foo");
        assert_eq!(owner.kind, "Widget");
        assert_eq!(owner.controller, Some(true));
    }
}
