mod descriptor;

pub use descriptor::{
    ClassRef, ProviderDescriptor, ReturnShape, SourceSpan, TestDescriptor, NO_PROVIDER_CLASS,
};
