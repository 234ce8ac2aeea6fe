//! Status helper enum mapping to the SMALLINT status column.
//!
//! Discriminants are the production wire values reported to clients
//! and written by the webhook receiver; they are part of the external
//! contract and must never be renumbered.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Generation task lifecycle status.
    ///
    /// The orchestrator only ever writes `Pending` (at creation,
    /// reconciliation, and fallback rewrite); the webhook receiver
    /// advances rows to the other states.
    GenerationStatus {
        Failed = 0,
        Processing = 1,
        Completed = 2,
        Pending = 3,
    }
}

/// Statuses whose cost counts toward a user's soft reservation.
pub const IN_FLIGHT_STATUSES: [StatusId; 2] = [
    GenerationStatus::Pending as StatusId,
    GenerationStatus::Processing as StatusId,
];
