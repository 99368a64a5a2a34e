pub mod institution;
pub mod letter;
pub mod person;
pub mod signature;
pub mod submission;

pub use institution::{Institution, InstitutionType};
pub use letter::{
    Letter, LetterAttribute, LetterDocument, LetterSignatureTemplate, LetterTemplate, Letterhead,
};
pub use person::{Official, Personnel, Student};
pub use signature::{LetterSignature, SignaturePosition};
pub use submission::{
    CarbonCopy, DocumentSubmission, LetterAttachment, LetterAttributeSubmission, Submission,
    SubmissionKind, SubmissionStatus,
};
