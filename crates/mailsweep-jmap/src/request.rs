//! JMAP request envelope (RFC 8620, Section 3.3).

use std::collections::BTreeSet;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// A named JMAP method whose arguments can be serialized into an
/// invocation.
pub trait Method: Serialize {
    /// The wire method name, e.g. `"Email/set"`.
    const NAME: &'static str;
    /// Capability URIs this method requires.
    const USING: &'static [&'static str];
}

/// A back-reference to the result of an earlier call in the same
/// request (RFC 8620, Section 3.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReference {
    /// Call id of the referenced invocation.
    pub result_of: String,
    /// Method name of the referenced invocation.
    pub name: String,
    /// JSON pointer into the referenced result.
    pub path: String,
}

/// A batch of named method invocations sent in one exchange.
///
/// Call ids are generated as `c0`, `c1`, ... in invocation order and
/// returned from [`Request::invoke`] so responses can be correlated.
#[derive(Debug, Default)]
pub struct Request {
    using: BTreeSet<&'static str>,
    calls: Vec<Invocation>,
}

#[derive(Debug)]
struct Invocation {
    name: &'static str,
    args: serde_json::Value,
    call_id: String,
}

impl Request {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        let mut using = BTreeSet::new();
        using.insert(crate::CORE_URI);
        Self {
            using,
            calls: Vec::new(),
        }
    }

    /// Appends a method invocation and returns its call id.
    ///
    /// # Errors
    ///
    /// Returns an error if the method arguments fail to serialize.
    pub fn invoke<M: Method>(&mut self, method: &M) -> Result<String> {
        self.using.extend(M::USING);
        let call_id = format!("c{}", self.calls.len());
        self.calls.push(Invocation {
            name: M::NAME,
            args: serde_json::to_value(method)?,
            call_id: call_id.clone(),
        });
        Ok(call_id)
    }

    /// Returns the number of invocations queued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns true if no invocation has been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Calls<'a>(&'a [Invocation]);

        impl Serialize for Calls<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for call in self.0 {
                    seq.serialize_element(&(call.name, &call.args, &call.call_id))?;
                }
                seq.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("using", &self.using)?;
        map.serialize_entry("methodCalls", &Calls(&self.calls))?;
        map.end()
    }
}
