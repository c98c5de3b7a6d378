use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Authorization errors
    NotAuthorized = 3,

    // Pool errors
    PoolEmpty = 4,
    PatientNotFound = 5,
    KidneyNotFound = 6,
    MaxCapacityReached = 7,

    // Registration / validation errors
    InvalidPra = 8,
    UnknownAntigen = 9,
    InvalidPreference = 10,

    // State import errors
    DuplicateId = 11,
    MissingCoPair = 12,
}
