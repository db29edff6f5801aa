/// 业务错误码，随 `ApiResponse.code` 返回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    AuthFailed = 1003,
    Forbidden = 1004,
    NotFound = 1005,
    Conflict = 1006,
    RateLimitExceeded = 1007,
    InternalServerError = 1008,

    // 用户
    UserNotFound = 2000,
    UserAlreadyExists = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserCreationFailed = 2005,

    // 教务资源
    ResourceNotFound = 3000,
    ResourceCreationFailed = 3001,
    ResourceDeleteFailed = 3002,
    ResourceReferenceInvalid = 3003,

    // 统计报表
    ReportScopeInvalid = 4000,
    ReportFailed = 4001,
}
