use crate::address::EditSession;
use crate::directory::DirectoryStatus;
use crate::error::{CheckoutError, ServiceError};
use crate::model::{
    AddressId, AddressPatch, AddressSnapshot, FormState, MethodList, SubmissionReceipt,
    SubmitOutcome,
};
use crate::tokenization::TokenizationPhase;
use tokio::sync::oneshot;

/// One-shot reply channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, CheckoutError>>;

/// Requests understood by the checkout actor.
#[derive(Debug)]
pub enum CheckoutRequest {
    FormState {
        respond_to: Response<FormState>,
    },
    UpdateBilling {
        patch: AddressPatch,
        respond_to: Response<FormState>,
    },
    SetUseShippingAsBilling {
        enabled: bool,
        respond_to: Response<FormState>,
    },
    SelectAddress {
        id: AddressId,
        respond_to: Response<FormState>,
    },
    SelectPaymentMethod {
        method: String,
        respond_to: Response<FormState>,
    },
    PaymentMethods {
        respond_to: Response<DirectoryStatus>,
    },
    RetryPaymentMethods {
        respond_to: Response<MethodList>,
    },
    TokenizationState {
        respond_to: Response<TokenizationPhase>,
    },
    Submit {
        respond_to: Response<SubmitOutcome>,
    },
    BeginEdit {
        respond_to: Response<EditSession>,
    },
    UpdateEdit {
        patch: AddressPatch,
        respond_to: Response<EditSession>,
    },
    CommitEdit {
        respond_to: Response<AddressSnapshot>,
    },
    CancelEdit {
        respond_to: Response<()>,
    },
    EditSession {
        respond_to: Response<Option<EditSession>>,
    },
}

/// Results of I/O the actor spawned, delivered back into its loop.
#[derive(Debug)]
pub(crate) enum Settlement {
    MethodsFetched(Result<MethodList, ServiceError>),
    PaymentSubmitted(Result<SubmissionReceipt, ServiceError>),
    AddressSaved(Result<AddressSnapshot, ServiceError>),
}
