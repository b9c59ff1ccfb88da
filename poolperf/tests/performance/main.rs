mod test_reshape;
mod test_service;
